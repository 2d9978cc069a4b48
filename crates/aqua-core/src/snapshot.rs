//! The most recent set of readings
//!
//! A [`SensorSnapshot`] is created once at startup and overwritten in
//! place every cycle. It carries no history.

use crate::config::{DISSOLVED_SOLIDS_PPM_PER_VOLT, MonitorConfig};
use crate::sensors::{SensorKind, TEMPERATURE_SCALE_MAX_C, is_probe_disconnected};

/// Latest converted value of every sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    /// Total dissolved solids in ppm
    pub dissolved_solids: f32,
    /// Turbidity in NTU
    pub turbidity: f32,
    /// Fill percentage, or probe volts when water level is uncalibrated
    pub water_level: f32,
    /// Water temperature in °C, possibly the disconnected sentinel
    pub temperature: f32,
}

/// One snapshot field prepared for presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub kind: SensorKind,
    pub value: f32,
    /// Unit label for the web dashboard
    pub unit: &'static str,
    /// Unit suffix for the display (ASCII only)
    pub display_unit: &'static str,
    /// Value that fills the bar to 100%
    pub scale_max: f32,
    /// `false` when the value is a sensor sentinel rather than a measurement
    pub valid: bool,
}

impl SensorSnapshot {
    pub fn value(&self, kind: SensorKind) -> f32 {
        match kind {
            SensorKind::DissolvedSolids => self.dissolved_solids,
            SensorKind::Turbidity => self.turbidity,
            SensorKind::WaterLevel => self.water_level,
            SensorKind::Temperature => self.temperature,
        }
    }

    /// Build the readout of one sensor under `config`.
    pub fn readout(&self, kind: SensorKind, config: &MonitorConfig) -> Readout {
        let value = self.value(kind);
        let (unit, display_unit, scale_max) = match kind {
            SensorKind::DissolvedSolids => ("ppm", "ppm", DISSOLVED_SOLIDS_PPM_PER_VOLT),
            SensorKind::Turbidity => ("NTU", "NTU", config.adc.vref),
            SensorKind::WaterLevel => {
                let unit = config.water_level.unit();
                (unit, unit, config.water_level.scale_max(&config.adc))
            }
            SensorKind::Temperature => ("°C", "C", TEMPERATURE_SCALE_MAX_C),
        };
        let valid = !(kind == SensorKind::Temperature && is_probe_disconnected(value));

        Readout {
            kind,
            value,
            unit,
            display_unit,
            scale_max,
            valid,
        }
    }

    /// Readouts of all four sensors in presentation order
    pub fn readouts(&self, config: &MonitorConfig) -> [Readout; 4] {
        SensorKind::ALL.map(|kind| self.readout(kind, config))
    }
}
