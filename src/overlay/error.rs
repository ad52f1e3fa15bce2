use std::{result, sync::Arc};

use thiserror::Error;

use super::{process::error::OverlayProcessFatalError, state::OverlayStatus};

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Overlay process already shutdown error")]
    OverlayAlreadyShutdown,

    #[error("Overlay process already terminated error, status: {0}")]
    OverlayAlreadyTerminated(OverlayStatus),

    #[error("Overlay shutdown procedure failed: {0}")]
    OverlayShutdownFailed(Arc<OverlayProcessFatalError>),
}

pub(super) type Result<T> = result::Result<T, OverlayError>;
