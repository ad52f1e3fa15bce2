use std::result;

use thiserror::Error;

/// Errors reported by the device API implementations.
///
/// The device itself is opaque to this crate, so failures are carried as messages provided by the
/// implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    #[error("Device rejected request: {0}")]
    Rejected(String),

    #[error("Device listener could not be registered: {0}")]
    ListenerRejected(String),
}

pub type DeviceResult<T> = result::Result<T, DeviceError>;
