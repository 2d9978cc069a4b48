//! ESP32-S3 firmware-specific modules for the aqua monitor
//!
//! This crate contains the hardware-specific code that cannot compile on
//! desktop targets: board power-up, the ADC bank, the 1-Wire temperature
//! bus, WiFi association and the TCP acceptor. Everything it builds is
//! handed to the `aqua_core` cycle through the capability traits.

#![no_std]

extern crate alloc;

pub mod analog;
pub mod board;
pub mod ds18b20_bus;
pub mod net;
pub mod wifi_secrets;
