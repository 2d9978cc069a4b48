//! Application-wide state and error types for the monitor

use core::fmt::{Debug, Write as _};

use thiserror_no_std::Error;

use crate::config::ConfigError;

/// Step of the monitoring cycle that runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Sample,
    PublishHttp,
    PublishDisplay,
    Idle,
}

impl CyclePhase {
    /// The phase that follows this one; `Idle` wraps back to `Sample`.
    pub const fn next(self) -> Self {
        match self {
            Self::Sample => Self::PublishHttp,
            Self::PublishHttp => Self::PublishDisplay,
            Self::PublishDisplay => Self::Idle,
            Self::Idle => Self::Sample,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid configuration: {0}")]
    Config(ConfigError),
    #[error("Display error: {0}")]
    Display(heapless::String<64>),
    #[error("Network error: {0}")]
    Network(heapless::String<64>),
    #[error("Board error: {0}")]
    Board(heapless::String<64>),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

/// Render `error` with some context into an error message.
///
/// Output that does not fit is cut off; the start of a driver error is
/// usually the informative part.
pub fn describe<E: Debug>(context: &str, error: E) -> heapless::String<64> {
    let mut message = heapless::String::new();
    let _ = write!(message, "{}: {:?}", context, error);
    message
}
