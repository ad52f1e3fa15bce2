use std::sync::{Arc, Mutex};

use tokio::{
    sync::broadcast::{self, error::RecvError},
    time,
};

use crate::{device::RoomDevice, display::DisplayState, util::AbortOnDropHandle};

use super::{
    config::{OverlayConfig, OverlayControllerConfig},
    error::{OverlayError, Result},
    process::{OverlayProcess, error::OverlayProcessFatalError},
    state::{OverlayReader, OverlayReceiver, OverlayStatus, OverlayStatusManager, OverlayUpdate},
};

/// Handle to a running overlay.
///
/// Exposes the overlay status, the believed display state and the update stream, and stops the
/// overlay process. Stopping only ends signal handling: no display command is issued, so an
/// overlay currently shown stays on screen until the device replaces it.
#[derive(Debug)]
pub struct OverlayController {
    config: OverlayControllerConfig,
    handle: Mutex<Option<AbortOnDropHandle<()>>>,
    shutdown_tx: broadcast::Sender<()>,
    status_manager: Arc<OverlayStatusManager>,
}

impl OverlayController {
    fn new(
        config: &OverlayConfig,
        handle: AbortOnDropHandle<()>,
        shutdown_tx: broadcast::Sender<()>,
        status_manager: Arc<OverlayStatusManager>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: config.into(),
            handle: Mutex::new(Some(handle)),
            shutdown_tx,
            status_manager,
        })
    }

    /// Returns an [`OverlayReader`] interface for accessing the overlay status and updates.
    pub fn reader(&self) -> Arc<dyn OverlayReader> {
        self.status_manager.clone()
    }

    /// Creates a new [`OverlayReceiver`] for subscribing to overlay updates.
    pub fn update_receiver(&self) -> OverlayReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current [`OverlayStatus`] as a snapshot.
    pub fn status_snapshot(&self) -> OverlayStatus {
        self.status_manager.status_snapshot()
    }

    /// Returns the believed [`DisplayState`] as a snapshot.
    pub fn display_snapshot(&self) -> DisplayState {
        self.status_manager.display_snapshot()
    }

    fn try_consume_handle(&self) -> Option<AbortOnDropHandle<()>> {
        self.handle
            .lock()
            .expect("`OverlayController` mutex can't be poisoned")
            .take()
    }

    /// Stops the overlay process.
    ///
    /// Pending notifications are dropped and the device listeners stop feeding the overlay. The
    /// display is left as it is: a shown overlay is not cleared. If the process does not stop
    /// within the configured shutdown timeout it is aborted.
    ///
    /// Can only be called once per controller. Returns an error if the process had already
    /// terminated, had to be aborted, or if shutdown was already requested.
    pub async fn shutdown(&self) -> Result<()> {
        let Some(mut handle) = self.try_consume_handle() else {
            return Err(OverlayError::OverlayAlreadyShutdown);
        };

        if handle.is_finished() {
            let status = self.status_manager.status_snapshot();
            return Err(OverlayError::OverlayAlreadyTerminated(status));
        }

        self.status_manager.update(OverlayStatus::ShutdownInitiated);

        let shutdown_send_res = self.shutdown_tx.send(()).map_err(|e| {
            handle.abort();
            OverlayProcessFatalError::SendShutdownSignalFailed(e)
        });

        let shutdown_res = match shutdown_send_res {
            Ok(_) => {
                tokio::select! {
                    join_res = &mut handle => {
                        join_res.map_err(OverlayProcessFatalError::OverlayProcessTaskJoin)
                    }
                    _ = time::sleep(self.config.shutdown_timeout()) => {
                        handle.abort();
                        Err(OverlayProcessFatalError::ShutdownTimeout)
                    }
                }
            }
            Err(e) => Err(e),
        };

        if let Err(e) = shutdown_res {
            let e_ref = Arc::new(e);
            self.status_manager.update(e_ref.clone().into());

            return Err(OverlayError::OverlayShutdownFailed(e_ref));
        }

        self.status_manager.update(OverlayStatus::Shutdown);
        Ok(())
    }

    /// Waits until the overlay process has stopped, through [`shutdown`](Self::shutdown) or a
    /// closed notification queue, and returns the final status.
    pub async fn until_stopped(&self) -> OverlayStatus {
        let mut update_rx = self.update_receiver();

        let status = self.status_snapshot();
        if status.is_stopped() {
            return status;
        }

        loop {
            match update_rx.recv().await {
                Ok(update) => {
                    if let OverlayUpdate::Status(status) = update
                        && status.is_stopped()
                    {
                        return status;
                    }
                }
                Err(RecvError::Lagged(_)) => {
                    let status = self.status_snapshot();
                    if status.is_stopped() {
                        return status;
                    }
                }
                Err(RecvError::Closed) => return self.status_snapshot(),
            }
        }
    }
}

/// Builder for configuring and starting the overlay process.
///
/// `OverlayEngine` encapsulates the configuration and the device the overlay runs on. The process
/// is spawned when [`start`](Self::start) is called, and an [`OverlayController`] is returned for
/// monitoring and management.
pub struct OverlayEngine {
    config: OverlayConfig,
    device: Arc<dyn RoomDevice>,
    status_manager: Arc<OverlayStatusManager>,
}

impl OverlayEngine {
    /// Creates a new overlay engine for `device`.
    pub fn new(config: impl Into<OverlayConfig>, device: Arc<dyn RoomDevice>) -> Self {
        let config = config.into();

        let (update_tx, _) =
            broadcast::channel::<OverlayUpdate>(config.update_channel_capacity().get());

        let status_manager = OverlayStatusManager::new(update_tx);

        Self {
            config,
            device,
            status_manager,
        }
    }

    /// Returns a reader interface for accessing the overlay status and updates.
    pub fn reader(&self) -> Arc<dyn OverlayReader> {
        self.status_manager.clone()
    }

    /// Creates a new receiver for subscribing to overlay updates.
    ///
    /// Receivers created before [`start`](Self::start) observe the whole activation sequence.
    pub fn update_receiver(&self) -> OverlayReceiver {
        self.status_manager.update_receiver()
    }

    /// Returns the current overlay status as a snapshot.
    pub fn status_snapshot(&self) -> OverlayStatus {
        self.status_manager.status_snapshot()
    }

    /// Starts the overlay process and returns an [`OverlayController`] for managing it.
    ///
    /// This consumes the engine and spawns the overlay task in the background.
    pub fn start(self) -> Arc<OverlayController> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let handle = OverlayProcess::spawn(
            &self.config,
            self.device,
            &shutdown_tx,
            self.status_manager.clone(),
        );

        OverlayController::new(&self.config, handle, shutdown_tx, self.status_manager)
    }
}

#[cfg(test)]
mod tests;
