//! DS18B20 probes on a bit-banged 1-Wire bus
//!
//! The `one-wire-bus` and `ds18b20` drivers speak embedded-hal 0.2, so the
//! bus pin and the microsecond delay are wrapped in small adapters. The
//! bit timing itself is blocking; only the conversion wait yields.

use core::convert::Infallible;

use aqua_core::sensors::{SensorError, TemperatureBus};
use ds18b20::{Ds18b20, Resolution};
use embassy_time::Timer;
use embedded_hal_02::blocking::delay::DelayUs;
use embedded_hal_02::digital::v2::{InputPin, OutputPin};
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, InputConfig, OutputConfig, Pull};
use log::{info, warn};
use one_wire_bus::{Address, OneWire};

use crate::board::OneWireBusPin;

/// Probes remembered from the last bus scan.
const MAX_PROBES: usize = 4;

const SENSOR: &str = "DS18B20";

/// Open-drain GPIO usable as a 1-Wire data line.
pub struct OneWirePin {
    pin: Flex<'static>,
}

impl OneWirePin {
    pub fn new(pin: OneWireBusPin) -> Self {
        let mut pin = Flex::new(pin);
        pin.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
        pin.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        pin.set_high();
        pin.set_input_enable(true);
        pin.set_output_enable(true);
        Self { pin }
    }
}

impl OutputPin for OneWirePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high();
        Ok(())
    }
}

impl InputPin for OneWirePin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}

/// Busy-wait delay with microsecond resolution for the bit timing.
pub struct BusDelay(Delay);

impl DelayUs<u16> for BusDelay {
    fn delay_us(&mut self, us: u16) {
        self.0.delay_micros(us as u32);
    }
}

/// Every DS18B20 found on one data line.
///
/// `bus` is `None` when the line was not pulled high at startup; every
/// conversion then reports the probe as missing.
pub struct Ds18b20Bus {
    bus: Option<OneWire<OneWirePin>>,
    delay: BusDelay,
    probes: heapless::Vec<Address, MAX_PROBES>,
}

impl Ds18b20Bus {
    pub fn new(pin: OneWirePin) -> Self {
        let bus = match OneWire::new(pin) {
            Ok(bus) => Some(bus),
            Err(e) => {
                warn!("1-Wire line is not pulled high ({:?}); temperature unavailable", e);
                None
            }
        };
        Self {
            bus,
            delay: BusDelay(Delay::new()),
            probes: heapless::Vec::new(),
        }
    }

    /// Rescan the bus and remember every DS18B20 in discovery order.
    pub fn scan(&mut self) -> usize {
        self.probes.clear();
        let Some(bus) = self.bus.as_mut() else {
            return 0;
        };
        let mut devices = 0u32;

        for found in bus.devices(false, &mut self.delay) {
            match found {
                Ok(address) => {
                    devices = devices.saturating_add(1);
                    if address.family_code() == ds18b20::FAMILY_CODE
                        && self.probes.push(address).is_err()
                    {
                        warn!("More than {} temperature probes; ignoring the rest", MAX_PROBES);
                        break;
                    }
                }
                Err(e) => {
                    warn!("1-Wire device scan failed: {:?}", e);
                    break;
                }
            }
        }

        if self.probes.is_empty() {
            warn!("No DS18B20 found ({} 1-Wire device(s) on the bus)", devices);
        } else {
            info!("Found {} DS18B20 probe(s)", self.probes.len());
        }
        self.probes.len()
    }

    fn forget_probes(&mut self) {
        self.probes.clear();
    }
}

impl TemperatureBus for Ds18b20Bus {
    async fn request_conversion(&mut self) -> Result<(), SensorError> {
        if self.probes.is_empty() && self.scan() == 0 {
            return Err(SensorError::NotFound { sensor: SENSOR });
        }
        let Some(bus) = self.bus.as_mut() else {
            return Err(SensorError::NotFound { sensor: SENSOR });
        };

        if let Err(e) = ds18b20::start_simultaneous_temp_measurement(bus, &mut self.delay) {
            warn!("Failed to start DS18B20 conversion: {:?}", e);
            self.forget_probes();
            return Err(SensorError::ReadFailed {
                sensor: SENSOR,
                operation: "start a conversion",
            });
        }

        Timer::after_millis(Resolution::Bits12.max_measurement_time_millis() as u64).await;
        Ok(())
    }

    async fn read_celsius(&mut self, probe: usize) -> Result<f32, SensorError> {
        let (Some(bus), Some(&address)) = (self.bus.as_mut(), self.probes.get(probe)) else {
            return Err(SensorError::NotFound { sensor: SENSOR });
        };

        let sensor = Ds18b20::new::<Infallible>(address).map_err(|_| SensorError::ReadFailed {
            sensor: SENSOR,
            operation: "validate the probe address",
        })?;

        match sensor.read_data(bus, &mut self.delay) {
            Ok(data) => Ok(data.temperature),
            Err(e) => {
                warn!("Failed to read DS18B20 {:?}: {:?}", address, e);
                self.forget_probes();
                Err(SensorError::ReadFailed {
                    sensor: SENSOR,
                    operation: "read the scratchpad",
                })
            }
        }
    }
}
