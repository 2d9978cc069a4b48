//! Simulated panel shared between the monitor and the SDL window

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use aqua_core::display::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::SimulatorDisplay;

pub type PanelHandle = Rc<RefCell<SimulatorDisplay<Rgb565>>>;

/// `DrawTarget` that writes through to a [`SimulatorDisplay`] owned elsewhere.
///
/// The monitor owns this as its panel while the window keeps a
/// [`PanelHandle`] to show the frames in between cycles.
pub struct SharedPanel(PanelHandle);

impl SharedPanel {
    /// A blank panel the size of the device display, plus a handle to it.
    pub fn new() -> (Self, PanelHandle) {
        let handle = Rc::new(RefCell::new(SimulatorDisplay::new(Size::new(
            DISPLAY_WIDTH_PX as u32,
            DISPLAY_HEIGHT_PX as u32,
        ))));
        (Self(Rc::clone(&handle)), handle)
    }
}

impl OriginDimensions for SharedPanel {
    fn size(&self) -> Size {
        self.0.borrow().size()
    }
}

impl DrawTarget for SharedPanel {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.0.borrow_mut().draw_iter(pixels)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.0.borrow_mut().fill_contiguous(area, colors)
    }
}
