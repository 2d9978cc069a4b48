//! Sensor capabilities consumed by the sampler
//!
//! The monitor reads three analog probes through one ADC and a digital
//! temperature probe on a shared bus. Both are external drivers; this
//! module only fixes the narrow interface the sampler needs from them.

mod temperature;

use thiserror_no_std::Error;

pub use temperature::*;

/// The four quantities the monitor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    DissolvedSolids,
    Turbidity,
    WaterLevel,
    Temperature,
}

impl SensorKind {
    /// All sensors in presentation order
    pub const ALL: [Self; 4] = [
        Self::DissolvedSolids,
        Self::Turbidity,
        Self::WaterLevel,
        Self::Temperature,
    ];

    /// Label used on the web dashboard cards
    pub const fn label(self) -> &'static str {
        match self {
            Self::DissolvedSolids => "TDS",
            Self::Turbidity => "Turbidity",
            Self::WaterLevel => "Water Level",
            Self::Temperature => "Temperature",
        }
    }

    /// Label used on the local display
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::DissolvedSolids => "TDS",
            Self::Turbidity => "Turbidity",
            Self::WaterLevel => "Water Level",
            Self::Temperature => "Water Temp",
        }
    }
}

/// Analog channels wired to the ADC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    DissolvedSolids,
    Turbidity,
    WaterLevel,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("no {sensor} device found on the bus")]
    NotFound { sensor: &'static str },
    #[error("{sensor} failed to {operation}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
    },
}

/// Source of raw ADC codes.
///
/// Reads never fail: a misbehaving channel yields a numerically wrong
/// code, which is still a well-formed sample.
pub trait AnalogInputs {
    /// Read one raw conversion in `[0, AdcConfig::max_code]`.
    fn read_raw(&mut self, channel: AnalogChannel) -> impl Future<Output = u16>;
}

/// Digital temperature bus with one or more probes.
pub trait TemperatureBus {
    /// Start a conversion on every probe and wait until it completes.
    fn request_conversion(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Read the last converted temperature of probe `probe`, in Celsius.
    fn read_celsius(&mut self, probe: usize) -> impl Future<Output = Result<f32, SensorError>>;
}
