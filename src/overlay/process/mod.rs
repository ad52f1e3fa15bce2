use std::sync::Arc;

use tokio::{
    sync::{broadcast, mpsc},
    time,
};
use tracing::{debug, info, warn};

use crate::{
    device::RoomDevice,
    display::DisplayDecisionEngine,
    signal::{ActivationReport, SignalNotificationReceiver, SignalRegistry},
    util::{AbortOnDropHandle, Never},
};

use super::{
    config::{OverlayConfig, OverlayProcessConfig},
    state::{OverlayStatus, OverlayStatusManager, OverlayStatusNotRunning, ReconciliationRecord},
};

pub(crate) mod error;

use error::{OverlayProcessFatalError, ProcessResult};

/// Single task owning the signal registry and the display decision engine.
///
/// Activation reads, notifications and display commands all run inside this task, so the signal
/// state is never mutated concurrently and notifications are handled in delivery order.
pub(super) struct OverlayProcess {
    config: OverlayProcessConfig,
    device: Arc<dyn RoomDevice>,
    status_manager: Arc<OverlayStatusManager>,
}

impl OverlayProcess {
    pub fn spawn(
        config: &OverlayConfig,
        device: Arc<dyn RoomDevice>,
        shutdown_tx: &broadcast::Sender<()>,
        status_manager: Arc<OverlayStatusManager>,
    ) -> AbortOnDropHandle<()> {
        let config = config.into();

        // Subscribe before spawning so an early shutdown request can't be missed
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let process = Self {
                config,
                device,
                status_manager,
            };

            process.run_until_shutdown(shutdown_rx).await
        })
        .into()
    }

    /// Seeds the readings of an activation pass, publishes the report and reconciles once.
    async fn apply_activation(&self, engine: &mut DisplayDecisionEngine, report: ActivationReport) {
        for (signal, value) in report.initial_readings() {
            engine.seed(signal, value);
        }

        let failure_count = report.failures().len();
        if failure_count > 0 {
            warn!("{failure_count} signal activation error(s)");
        }

        self.status_manager.activation(report);

        let reconciliation = engine.reconcile().await;
        self.status_manager
            .reconciled(ReconciliationRecord::new(engine.signals(), reconciliation));
    }

    async fn handle_notifications(
        &self,
        registry: &mut SignalRegistry,
        engine: &mut DisplayDecisionEngine,
        notification_rx: &mut SignalNotificationReceiver,
    ) -> ProcessResult<Never> {
        let retry_interval = self.config.registration_retry_interval();
        let mut retries_left = self.config.registration_retries();

        let retry_timer = time::sleep(retry_interval);
        tokio::pin!(retry_timer);

        loop {
            let retry_pending = retries_left > 0 && registry.has_unregistered();

            tokio::select! {
                notification = notification_rx.recv() => {
                    let Some(notification) = notification else {
                        return Err(OverlayProcessFatalError::NotificationQueueClosed);
                    };

                    debug!("Signal notification received: {notification}");

                    let reconciliation = engine.on_signal(notification).await;

                    self.status_manager
                        .reconciled(ReconciliationRecord::new(engine.signals(), reconciliation));
                }
                _ = &mut retry_timer, if retry_pending => {
                    retries_left -= 1;
                    debug!("Registration retry pass ({retries_left} left)");

                    let report = registry.retry_unregistered().await;
                    self.apply_activation(engine, report).await;

                    retry_timer
                        .as_mut()
                        .reset(time::Instant::now() + retry_interval);
                }
            }
        }
    }

    async fn run(&self) -> ProcessResult<Never> {
        info!("Overlay initialization started...");

        self.status_manager
            .update(OverlayStatusNotRunning::Activating.into());

        let timeout = self.config.device_request_timeout();
        let (notification_tx, mut notification_rx) = mpsc::unbounded_channel();

        let mut registry = SignalRegistry::new(self.device.as_ref(), notification_tx, timeout);
        let mut engine = DisplayDecisionEngine::new(
            self.config.target().clone(),
            self.device.display_sink(),
            timeout,
        );

        let report = registry.activate_all().await;
        self.apply_activation(&mut engine, report).await;

        self.status_manager.update(OverlayStatus::Running);

        info!("Overlay initialization complete!");

        self.handle_notifications(&mut registry, &mut engine, &mut notification_rx)
            .await
    }

    async fn run_until_shutdown(self, mut shutdown_rx: broadcast::Receiver<()>) {
        tokio::select! {
            Err(e) = self.run() => {
                self.status_manager.update(e.into());
            }
            shutdown_res = shutdown_rx.recv() => {
                if let Err(e) = shutdown_res {
                    let status = OverlayProcessFatalError::ShutdownSignalRecv(e).into();
                    self.status_manager.update(status);
                }

                // Shutdown signal received
            }
        }
    }
}
