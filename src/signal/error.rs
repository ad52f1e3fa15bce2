use std::result;

use thiserror::Error;

use crate::device::error::DeviceError;

use super::core::SignalName;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalActivationError {
    #[error("The [{0}] subscription is already active, unable to fire it again")]
    AlreadyActive(SignalName),

    #[error(
        "The [{0}] listener registration timed out and may be live on the device, not registering \
         it again"
    )]
    Unconfirmed(SignalName),

    #[error("[{signal}] precondition `{setting}` could not be enforced: {source}")]
    Precondition {
        signal: SignalName,
        setting: &'static str,
        source: DeviceError,
    },

    #[error("[{signal}] initial read failed: {source}")]
    Fetch {
        signal: SignalName,
        source: DeviceError,
    },

    #[error("[{signal}] listener registration failed: {source}")]
    Listen {
        signal: SignalName,
        source: DeviceError,
    },

    #[error("[{signal}] device request timed out during {stage}")]
    Timeout {
        signal: SignalName,
        stage: &'static str,
    },
}

impl SignalActivationError {
    /// Returns the signal the error refers to.
    pub fn signal(&self) -> SignalName {
        match self {
            Self::AlreadyActive(signal) | Self::Unconfirmed(signal) => *signal,
            Self::Precondition { signal, .. }
            | Self::Fetch { signal, .. }
            | Self::Listen { signal, .. }
            | Self::Timeout { signal, .. } => *signal,
        }
    }

    /// Returns `true` for activation attempts refused because a listener is, or may already be,
    /// registered. These are harmless.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyActive(_) | Self::Unconfirmed(_))
    }
}

pub(crate) type ActivationResult<T> = result::Result<T, SignalActivationError>;
