//! Board bring-up for the monitor
//!
//! Pin assignments and the power sequencing that has to happen before the
//! panel or any probe is touched.

use core::fmt::Debug;

use aqua_core::app_state::{AppError, describe};
use axp2101_embedded::AsyncAxp2101;
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::time::Rate;
use log::info;

/// ADC1 input of the dissolved-solids probe
pub type TdsPin = esp_hal::peripherals::GPIO8<'static>;
/// ADC1 input of the turbidity probe
pub type TurbidityPin = esp_hal::peripherals::GPIO9<'static>;
/// ADC1 input of the water-level probe
pub type WaterLevelPin = esp_hal::peripherals::GPIO10<'static>;
/// Data line of the DS18B20 bus, with external 4.7k pull-up
pub type OneWireBusPin = esp_hal::peripherals::GPIO17<'static>;

pub type PowerManager = AsyncAxp2101<I2c<'static, esp_hal::Async>>;

/// Turn a driver error into a board error, keeping its debug text.
pub fn board_error<E: Debug>(context: &str, error: E) -> AppError {
    AppError::Board(describe(context, error))
}

/// Create the I2C bus that reaches the PMIC.
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO12<'static>,
    scl: esp_hal::peripherals::GPIO11<'static>,
) -> Result<I2c<'static, esp_hal::Async>, AppError> {
    let bus = I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400)))
        .map_err(|e| board_error("I2C config", e))?
        .with_sda(sda)
        .with_scl(scl)
        .into_async();
    Ok(bus)
}

/// Bring up the power rails for the panel and the probes.
///
/// ALDO4 feeds the panel at 3.3 V; the other LDOs feed the probe headers.
pub async fn power_up(i2c: I2c<'static, esp_hal::Async>) -> Result<PowerManager, AppError> {
    info!("Configuring power management");
    let mut pmic = AsyncAxp2101::new(i2c);

    pmic.init().await.map_err(|e| board_error("PMIC init", e))?;
    pmic.set_charging_led_mode(axp2101_embedded::ChargeLedMode::On)
        .await
        .map_err(|e| board_error("charge LED", e))?;

    pmic.enable_aldo1().await.map_err(|e| board_error("ALDO1", e))?;
    pmic.enable_aldo2().await.map_err(|e| board_error("ALDO2", e))?;
    pmic.enable_aldo3().await.map_err(|e| board_error("ALDO3", e))?;
    pmic.enable_aldo4().await.map_err(|e| board_error("ALDO4", e))?;
    pmic.enable_bldo1().await.map_err(|e| board_error("BLDO1", e))?;
    pmic.enable_bldo2().await.map_err(|e| board_error("BLDO2", e))?;
    pmic.enable_dldo1().await.map_err(|e| board_error("DLDO1", e))?;
    pmic.set_aldo4_voltage(3300)
        .await
        .map_err(|e| board_error("ALDO4 voltage", e))?;

    info!("Power management ready");
    Ok(pmic)
}
