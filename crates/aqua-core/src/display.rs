//! Local display summary
//!
//! The display shows a title and one line per sensor. It is fully redrawn
//! every cycle: clear, draw every line, present.

use core::fmt::Write as _;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use crate::framebuffer::FrameBuffer;
use crate::snapshot::Readout;

pub const DISPLAY_WIDTH_PX: u16 = 320;
pub const DISPLAY_HEIGHT_PX: u16 = 240;

pub const TITLE: &str = "Water Quality System";

/// Left margin of every line
const MARGIN_X_PX: i32 = 8;
const TITLE_Y_PX: i32 = 8;
const FIRST_LINE_Y_PX: i32 = 48;
const LINE_PITCH_PX: i32 = 32;

/// Longest summary line, e.g. `Water Level: 100.00 %`
pub const MAX_LINE_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontScale {
    /// 6x10 glyphs
    Small,
    /// 10x20 glyphs
    Large,
}

impl FontScale {
    pub const fn font(self) -> &'static MonoFont<'static> {
        match self {
            Self::Small => &FONT_6X10,
            Self::Large => &FONT_10X20,
        }
    }
}

/// Text-oriented display capability.
pub trait TextDisplay {
    type Error: core::fmt::Debug;

    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        scale: FontScale,
        text: &str,
    ) -> Result<(), Self::Error>;

    /// Make everything drawn since the last `clear` visible.
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Format the display line of one readout.
pub fn format_line(readout: &Readout) -> heapless::String<MAX_LINE_LEN> {
    let mut line = heapless::String::new();
    // Truncation only happens for absurd values; a short line is acceptable
    let _ = if readout.valid {
        write!(
            line,
            "{}: {:.2} {}",
            readout.kind.short_label(),
            readout.value,
            readout.display_unit
        )
    } else {
        write!(line, "{}: no probe", readout.kind.short_label())
    };
    line
}

/// Redraw the whole summary frame.
pub fn render_summary<T: TextDisplay>(
    display: &mut T,
    readouts: &[Readout],
) -> Result<(), T::Error> {
    display.clear()?;
    display.draw_text(MARGIN_X_PX, TITLE_Y_PX, FontScale::Large, TITLE)?;

    let mut y = FIRST_LINE_Y_PX;
    for readout in readouts {
        display.draw_text(MARGIN_X_PX, y, FontScale::Large, &format_line(readout))?;
        y += LINE_PITCH_PX;
    }

    display.present()
}

/// [`TextDisplay`] that draws into a [`FrameBuffer`] and flushes it to a panel.
pub struct BufferedDisplay<P> {
    framebuffer: FrameBuffer,
    panel: P,
}

impl<P> BufferedDisplay<P>
where
    P: DrawTarget<Color = Rgb565>,
{
    /// The first `present` pushes the full frame, overwriting whatever
    /// the panel showed before.
    pub fn new(panel: P) -> Self {
        let mut framebuffer = FrameBuffer::new(panel.bounding_box().size);
        framebuffer.invalidate();
        Self { framebuffer, panel }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }
}

impl<P> TextDisplay for BufferedDisplay<P>
where
    P: DrawTarget<Color = Rgb565>,
    P::Error: core::fmt::Debug,
{
    type Error = P::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        let Ok(()) = self.framebuffer.clear(Rgb565::BLACK);
        Ok(())
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        scale: FontScale,
        text: &str,
    ) -> Result<(), Self::Error> {
        let style = MonoTextStyle::new(scale.font(), Rgb565::WHITE);
        let Ok(_) = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.framebuffer);
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.framebuffer.flush(&mut self.panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use crate::mock::{DisplayOp, RecordingDisplay};
    use crate::sensors::{SensorKind, TEMPERATURE_DISCONNECTED_C};
    use crate::snapshot::SensorSnapshot;
    use alloc::string::String;
    use core::convert::Infallible;

    fn sample_snapshot() -> SensorSnapshot {
        SensorSnapshot {
            dissolved_solids: 412.5,
            turbidity: 1.234,
            water_level: 64.0,
            temperature: 22.5,
        }
    }

    #[test]
    fn test_line_format() {
        let config = MonitorConfig::default();
        let readouts = sample_snapshot().readouts(&config);

        assert_eq!(format_line(&readouts[0]).as_str(), "TDS: 412.50 ppm");
        assert_eq!(format_line(&readouts[1]).as_str(), "Turbidity: 1.23 NTU");
        assert_eq!(format_line(&readouts[2]).as_str(), "Water Level: 64.00 %");
        assert_eq!(format_line(&readouts[3]).as_str(), "Water Temp: 22.50 C");
    }

    #[test]
    fn test_disconnected_probe_line() {
        let snapshot = SensorSnapshot {
            temperature: TEMPERATURE_DISCONNECTED_C,
            ..sample_snapshot()
        };
        let readout = snapshot.readout(SensorKind::Temperature, &MonitorConfig::default());
        assert_eq!(format_line(&readout).as_str(), "Water Temp: no probe");
    }

    #[test]
    fn test_summary_full_redraw_order() {
        let mut display = RecordingDisplay::default();
        let readouts = sample_snapshot().readouts(&MonitorConfig::default());

        render_summary(&mut display, &readouts).unwrap();

        assert_eq!(display.ops.len(), 7);
        assert_eq!(display.ops[0], DisplayOp::Clear);
        assert_eq!(
            display.ops[1],
            DisplayOp::Text {
                x: MARGIN_X_PX,
                y: TITLE_Y_PX,
                scale: FontScale::Large,
                text: String::from(TITLE),
            }
        );
        let ys: alloc::vec::Vec<i32> = display.ops[2..6]
            .iter()
            .map(|op| match op {
                DisplayOp::Text { y, .. } => *y,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(ys, [48, 80, 112, 144]);
        assert_eq!(display.ops[6], DisplayOp::Present);
    }

    #[test]
    fn test_lines_fit_the_panel() {
        let snapshot = SensorSnapshot {
            dissolved_solids: 3300.0,
            turbidity: 3.3,
            water_level: 100.0,
            temperature: -55.0,
        };
        let width = FontScale::Large.font().character_size.width as usize;
        for readout in snapshot.readouts(&MonitorConfig::default()) {
            let line = format_line(&readout);
            assert!(MARGIN_X_PX as usize + line.len() * width <= DISPLAY_WIDTH_PX as usize);
        }
    }

    /// Panel that counts flushed pixels.
    struct CountingPanel {
        flushed: usize,
    }

    impl OriginDimensions for CountingPanel {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
        }
    }

    impl DrawTarget for CountingPanel {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.flushed += pixels.into_iter().count();
            Ok(())
        }
    }

    #[test]
    fn test_buffered_display_flushes_on_present() {
        let mut display = BufferedDisplay::new(CountingPanel { flushed: 0 });
        let readouts = sample_snapshot().readouts(&MonitorConfig::default());

        let Ok(()) = render_summary(&mut display, &readouts);
        let first = display.panel().flushed;
        assert_eq!(first, DISPLAY_WIDTH_PX as usize * DISPLAY_HEIGHT_PX as usize);
        assert!(display.framebuffer().dirty_area().is_none());

        // Later frames only resend the text region
        let Ok(()) = render_summary(&mut display, &readouts);
        let second = display.panel().flushed - first;
        assert!(second > 0);
        assert!(second < first);
    }

    /// Panel that keeps its pixels, starting from arbitrary content.
    struct MemoryPanel {
        pixels: alloc::vec::Vec<Rgb565>,
    }

    impl MemoryPanel {
        fn filled(color: Rgb565) -> Self {
            Self {
                pixels: alloc::vec![color; DISPLAY_WIDTH_PX as usize * DISPLAY_HEIGHT_PX as usize],
            }
        }
    }

    impl OriginDimensions for MemoryPanel {
        fn size(&self) -> Size {
            Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
        }
    }

    impl DrawTarget for MemoryPanel {
        type Color = Rgb565;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            let width = DISPLAY_WIDTH_PX as i32;
            for Pixel(point, color) in pixels {
                if self.bounding_box().contains(point) {
                    self.pixels[(point.y * width + point.x) as usize] = color;
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_first_frame_overwrites_power_on_content() {
        let mut display = BufferedDisplay::new(MemoryPanel::filled(Rgb565::RED));
        let readouts = sample_snapshot().readouts(&MonitorConfig::default());

        let Ok(()) = render_summary(&mut display, &readouts);

        let stale = display
            .panel()
            .pixels
            .iter()
            .filter(|c| **c == Rgb565::RED)
            .count();
        assert_eq!(stale, 0);
        let shown = display
            .panel()
            .pixels
            .iter()
            .zip(display.framebuffer().bounding_box().points())
            .all(|(c, p)| Some(*c) == display.framebuffer().pixel(p));
        assert!(shown);
    }
}
