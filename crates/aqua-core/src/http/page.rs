//! HTML dashboard rendering
//!
//! The page is a static document with one card per sensor; it never
//! refreshes itself, the client reloads to get the next sample.

use core::fmt::{self, Write};

use crate::snapshot::Readout;

/// Everything before the first card.
const PAGE_HEAD: &str = "<!DOCTYPE html>\r\n\
<html>\r\n\
<head>\r\n\
<meta charset='utf-8'>\r\n\
<title>Water Quality Monitoring</title>\r\n\
<style>\r\n\
body { font-family: Arial, sans-serif; background: #f0f4f8; color: #333; \
text-align: center; margin: 0; padding: 0; }\r\n\
h1 { background: #0078d7; color: white; padding: 20px 0; margin: 0; }\r\n\
.container { margin: 20px auto; max-width: 800px; text-align: left; }\r\n\
.card { background: white; border-radius: 8px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); \
margin: 20px 0; padding: 20px; }\r\n\
.level { display: flex; align-items: center; margin: 10px 0; }\r\n\
.level-label { width: 20%; font-weight: bold; }\r\n\
.progress { flex-grow: 1; height: 20px; border-radius: 10px; background: #e0e0e0; \
overflow: hidden; }\r\n\
.progress-bar { height: 100%; background: #0078d7; transition: width 0.3s; }\r\n\
</style>\r\n\
</head>\r\n\
<body>\r\n\
<h1>Water Quality Monitoring Dashboard</h1>\r\n\
<div class='container'>\r\n";

/// Everything after the last card.
const PAGE_TAIL: &str = "</div>\r\n</body>\r\n</html>\r\n";

/// Text shown instead of a value when the temperature probe is missing.
pub const PROBE_DISCONNECTED_TEXT: &str = "Probe disconnected";

/// Bar fill for `value` on a scale of `[0, scale_max]`, in percent.
///
/// Clamped to `[0, 100]`. Non-finite values and a non-positive scale
/// produce an empty bar.
pub fn bar_fill_percent(value: f32, scale_max: f32) -> f32 {
    if !value.is_finite() || !(scale_max > 0.0) {
        return 0.0;
    }
    (value / scale_max * 100.0).clamp(0.0, 100.0)
}

fn write_bar<W: Write>(out: &mut W, label: &str, fill: f32) -> fmt::Result {
    write!(
        out,
        "<div class='level'><span class='level-label'>{}:</span>\
<div class='progress'><div class='progress-bar' style='width: {:.2}%'></div></div></div>\r\n",
        label, fill
    )
}

/// Render one sensor card.
pub fn render_card<W: Write>(
    out: &mut W,
    label: &str,
    value: f32,
    unit: &str,
    scale_max: f32,
) -> fmt::Result {
    out.write_str("<div class='card'>\r\n")?;
    write_bar(out, label, bar_fill_percent(value, scale_max))?;
    write!(out, "<p>Value: {:.2} {}</p>\r\n", value, unit)?;
    out.write_str("</div>\r\n")
}

/// Render the card of a readout, substituting a placeholder for sentinels.
pub fn render_readout_card<W: Write>(out: &mut W, readout: &Readout) -> fmt::Result {
    if readout.valid {
        return render_card(
            out,
            readout.kind.label(),
            readout.value,
            readout.unit,
            readout.scale_max,
        );
    }

    out.write_str("<div class='card'>\r\n")?;
    write_bar(out, readout.kind.label(), 0.0)?;
    write!(out, "<p>Value: {}</p>\r\n", PROBE_DISCONNECTED_TEXT)?;
    out.write_str("</div>\r\n")
}

/// Render the complete dashboard document.
pub fn render_page<W: Write>(out: &mut W, readouts: &[Readout]) -> fmt::Result {
    out.write_str(PAGE_HEAD)?;
    for readout in readouts {
        render_readout_card(out, readout)?;
    }
    out.write_str(PAGE_TAIL)
}
