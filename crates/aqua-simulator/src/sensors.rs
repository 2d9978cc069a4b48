//! Synthetic probes that drift slowly so the dashboard has something to show.

use std::time::Instant;

use aqua_core::config::ADC_MAX;
use aqua_core::sensors::{AnalogChannel, AnalogInputs, SensorError, TemperatureBus};

/// Map a value in `[-1, 1]` onto a raw code between `low` and `high`.
fn code_between(wave: f64, low: f64, high: f64) -> u16 {
    let mid = (low + high) / 2.0;
    let amplitude = (high - low) / 2.0;
    (mid + amplitude * wave).clamp(0.0, ADC_MAX as f64) as u16
}

/// Analog channels driven by sine waves of different periods.
pub struct SyntheticAnalog {
    started: Instant,
}

impl SyntheticAnalog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl AnalogInputs for SyntheticAnalog {
    async fn read_raw(&mut self, channel: AnalogChannel) -> u16 {
        let t = self.started.elapsed().as_secs_f64();
        match channel {
            // Roughly 250-500 ppm
            AnalogChannel::DissolvedSolids => {
                code_between((t / 90.0).sin() + 0.05 * (t / 7.0).cos(), 310.0, 620.0)
            }
            // Clear water with the occasional cloudy spell
            AnalogChannel::Turbidity => code_between((t / 45.0).sin(), 60.0, 900.0),
            // Tank slowly filling and draining
            AnalogChannel::WaterLevel => code_between((t / 240.0).sin(), 500.0, 3200.0),
        }
    }
}

/// One DS18B20 stand-in that can be unplugged.
pub struct SyntheticProbe {
    started: Instant,
    connected: bool,
}

impl SyntheticProbe {
    pub fn new(connected: bool) -> Self {
        Self {
            started: Instant::now(),
            connected,
        }
    }
}

impl TemperatureBus for SyntheticProbe {
    async fn request_conversion(&mut self) -> Result<(), SensorError> {
        if self.connected {
            Ok(())
        } else {
            Err(SensorError::NotFound {
                sensor: "DS18B20",
            })
        }
    }

    async fn read_celsius(&mut self, probe: usize) -> Result<f32, SensorError> {
        if !self.connected || probe != 0 {
            return Err(SensorError::NotFound {
                sensor: "DS18B20",
            });
        }
        let t = self.started.elapsed().as_secs_f64();
        // 12-bit resolution is 1/16 °C
        let celsius = 21.0 + 2.5 * (t / 150.0).sin();
        Ok(((celsius * 16.0).round() / 16.0) as f32)
    }
}
