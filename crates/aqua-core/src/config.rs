//! Static configuration for the monitor
//!
//! Everything here is fixed at build time (firmware) or at startup
//! (simulator). Nothing is negotiated at runtime.

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Full-scale code of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// ADC reference voltage in volts.
pub const VREF: f32 = 3.3;

/// Fixed pause between two cycles.
pub const SAMPLE_INTERVAL_MS: u32 = 2000;

pub const HTTP_PORT: u16 = 80;

/// Water-level probe output with the tank empty, in volts.
pub const WATER_LEVEL_EMPTY_V: f32 = 0.5;

/// Water-level probe output with the tank full, in volts.
pub const WATER_LEVEL_FULL_V: f32 = 2.5;

/// Dissolved-solids probe sensitivity.
pub const DISSOLVED_SOLIDS_PPM_PER_VOLT: f32 = 1000.0;

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("ADC reference voltage must be positive, got {0}")]
    InvalidReference(f32),
    #[error("ADC full-scale code must be non-zero")]
    ZeroFullScale,
    #[error("water level full voltage ({full_v}) must exceed empty voltage ({empty_v})")]
    InvertedWaterLevel { empty_v: f32, full_v: f32 },
    #[error("calibration span must be finite and non-zero")]
    DegenerateSpan,
    #[error("clamp range minimum {min} exceeds maximum {max}")]
    InvertedClamp { min: f32, max: f32 },
    #[error("sample interval must be non-zero")]
    ZeroInterval,
}

/// ADC transfer characteristics shared by every analog channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AdcConfig {
    /// Voltage that corresponds to `max_code`
    pub vref: f32,
    /// Highest code the converter produces
    pub max_code: u16,
}

impl AdcConfig {
    pub const fn new(vref: f32, max_code: u16) -> Self {
        Self { vref, max_code }
    }

    /// Convert a raw code to volts.
    ///
    /// Codes above `max_code` are treated as full scale.
    pub fn to_voltage(&self, raw: u16) -> f32 {
        raw.min(self.max_code) as f32 * (self.vref / self.max_code as f32)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.vref > 0.0) {
            return Err(ConfigError::InvalidReference(self.vref));
        }
        if self.max_code == 0 {
            return Err(ConfigError::ZeroFullScale);
        }
        Ok(())
    }
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self::new(VREF, ADC_MAX)
    }
}

/// Inclusive output range applied after a [`LinearMapping`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ClampRange {
    pub min: f32,
    pub max: f32,
}

/// Affine calibration: `physical = (input - offset) / span * scale`,
/// optionally clamped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LinearMapping {
    pub offset: f32,
    pub span: f32,
    pub scale: f32,
    pub clamp: Option<ClampRange>,
}

impl LinearMapping {
    /// Pass the input through unchanged.
    pub const IDENTITY: Self = Self::scaled(1.0);

    /// Multiply the input by `scale`.
    pub const fn scaled(scale: f32) -> Self {
        Self {
            offset: 0.0,
            span: 1.0,
            scale,
            clamp: None,
        }
    }

    /// Map `[empty, full]` onto `[0, 100]`, clamping outside the window.
    pub const fn calibrated_percent(empty: f32, full: f32) -> Self {
        Self {
            offset: empty,
            span: full - empty,
            scale: 100.0,
            clamp: Some(ClampRange {
                min: 0.0,
                max: 100.0,
            }),
        }
    }

    pub fn apply(&self, input: f32) -> f32 {
        let value = (input - self.offset) / self.span * self.scale;
        match self.clamp {
            Some(range) => value.clamp(range.min, range.max),
            None => value,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.span.is_finite() || self.span == 0.0 {
            return Err(ConfigError::DegenerateSpan);
        }
        if let Some(range) = self.clamp
            && !(range.min <= range.max)
        {
            return Err(ConfigError::InvertedClamp {
                min: range.min,
                max: range.max,
            });
        }
        Ok(())
    }
}

/// How the water-level channel is interpreted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WaterLevelMode {
    /// Report the probe voltage as-is
    Voltage,
    /// Report a fill percentage between two calibrated probe voltages
    Calibrated { empty_v: f32, full_v: f32 },
}

impl WaterLevelMode {
    pub fn mapping(&self) -> LinearMapping {
        match *self {
            Self::Voltage => LinearMapping::IDENTITY,
            Self::Calibrated { empty_v, full_v } => {
                LinearMapping::calibrated_percent(empty_v, full_v)
            }
        }
    }

    /// Upper end of the bar scale for this mode
    pub fn scale_max(&self, adc: &AdcConfig) -> f32 {
        match self {
            Self::Voltage => adc.vref,
            Self::Calibrated { .. } => 100.0,
        }
    }

    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Calibrated { .. } => "%",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Self::Calibrated { empty_v, full_v } = *self
            && !(full_v > empty_v)
        {
            return Err(ConfigError::InvertedWaterLevel { empty_v, full_v });
        }
        self.mapping().validate()
    }
}

impl Default for WaterLevelMode {
    fn default() -> Self {
        Self::Calibrated {
            empty_v: WATER_LEVEL_EMPTY_V,
            full_v: WATER_LEVEL_FULL_V,
        }
    }
}

/// Runtime-independent settings of the sampling and serving loop
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub adc: AdcConfig,
    pub water_level: WaterLevelMode,
    pub sample_interval_ms: u32,
    pub http_port: u16,
    /// Index of the probe on the temperature bus
    pub temperature_probe: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            adc: AdcConfig::default(),
            water_level: WaterLevelMode::default(),
            sample_interval_ms: SAMPLE_INTERVAL_MS,
            http_port: HTTP_PORT,
            temperature_probe: 0,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.adc.validate()?;
        self.water_level.validate()?;
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }
}
