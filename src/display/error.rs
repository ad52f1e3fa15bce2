use std::result;

use thiserror::Error;

use crate::device::error::DeviceError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayCommandError {
    #[error("Show command failed: {0}")]
    Show(DeviceError),

    #[error("Visible pages query failed: {0}")]
    ListVisible(DeviceError),

    #[error("Clear command failed: {0}")]
    Clear(DeviceError),

    #[error("Display sink timed out during `{0}`")]
    Timeout(&'static str),
}

pub(crate) type DisplayCommandResult<T> = result::Result<T, DisplayCommandError>;
