//! Hardware-independent core library for the aqua water-quality monitor
//!
//! This crate contains all platform-agnostic logic of the monitor: the
//! sensor snapshot and its calibration, the sampler, the HTML and display
//! publishers, and the cycle that ties them together. Hardware reaches it
//! only through the capability traits in [`sensors`], [`http`] and
//! [`display`].
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod display;
pub mod framebuffer;
pub mod http;
pub mod link;
pub mod monitor;
pub mod sampling;
pub mod sensors;
pub mod snapshot;

#[cfg(test)]
mod mock;
