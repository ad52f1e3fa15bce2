use std::result;

use thiserror::Error;
use tokio::{
    sync::broadcast::error::{RecvError, SendError},
    task::JoinError,
};

#[derive(Error, Debug)]
pub enum OverlayProcessFatalError {
    #[error("Signal notification queue closed")]
    NotificationQueueClosed,

    #[error("TaskJoin error {0}")]
    OverlayProcessTaskJoin(JoinError),

    #[error("Shutdown `RecvError` error: {0}")]
    ShutdownSignalRecv(RecvError),

    #[error("Failed to send overlay process shutdown request error: {0}")]
    SendShutdownSignalFailed(SendError<()>),

    #[error("Overlay shutdown timeout error")]
    ShutdownTimeout,
}

pub(crate) type ProcessResult<T> = result::Result<T, OverlayProcessFatalError>;
