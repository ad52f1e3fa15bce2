use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::{
    display::{DisplayState, Reconciliation},
    signal::{ActivationReport, SignalState},
};

use super::process::error::OverlayProcessFatalError;

/// Detailed status when the overlay process is not yet handling signal changes.
#[derive(Debug, Clone)]
pub enum OverlayStatusNotRunning {
    /// Overlay process has not been started yet.
    NotInitiated,
    /// Overlay process is activating the signal subscriptions.
    Activating,
}

impl fmt::Display for OverlayStatusNotRunning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitiated => write!(f, "Not initiated"),
            Self::Activating => write!(f, "Activating"),
        }
    }
}

/// Overall status of the overlay process.
#[derive(Debug, Clone)]
pub enum OverlayStatus {
    /// Overlay process is not handling signal changes yet.
    NotRunning(OverlayStatusNotRunning),
    /// Signals are activated and changes are being handled.
    Running,
    /// Shutdown has been requested and is in progress.
    ShutdownInitiated,
    /// Overlay process has been gracefully shut down.
    Shutdown,
    /// Overlay process terminated due to a fatal error.
    Terminated(Arc<OverlayProcessFatalError>),
}

impl OverlayStatus {
    /// Returns `true` if the overlay process has stopped (either shut down or terminated).
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Shutdown | Self::Terminated(_))
    }
}

impl fmt::Display for OverlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning(status) => write!(f, "Not running ({status})"),
            Self::Running => write!(f, "Running"),
            Self::ShutdownInitiated => write!(f, "Shutdown initiated"),
            Self::Shutdown => write!(f, "Shutdown"),
            Self::Terminated(error) => write!(f, "Terminated: {error}"),
        }
    }
}

impl From<OverlayStatusNotRunning> for OverlayStatus {
    fn from(value: OverlayStatusNotRunning) -> Self {
        Self::NotRunning(value)
    }
}

impl From<Arc<OverlayProcessFatalError>> for OverlayStatus {
    fn from(value: Arc<OverlayProcessFatalError>) -> Self {
        Self::Terminated(value)
    }
}

impl From<OverlayProcessFatalError> for OverlayStatus {
    fn from(value: OverlayProcessFatalError) -> Self {
        Arc::new(value).into()
    }
}

/// Record of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconciliationRecord {
    time: DateTime<Utc>,
    signals: SignalState,
    reconciliation: Reconciliation,
}

impl ReconciliationRecord {
    pub(crate) fn new(signals: SignalState, reconciliation: Reconciliation) -> Self {
        Self {
            time: Utc::now(),
            signals,
            reconciliation,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Signal state the pass evaluated.
    pub fn signals(&self) -> SignalState {
        self.signals
    }

    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }

    /// Believed display state after the pass.
    pub fn display_state(&self) -> DisplayState {
        self.reconciliation.state()
    }
}

impl fmt::Display for ReconciliationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.time.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.signals,
            self.reconciliation
        )
    }
}

/// Update events emitted by the overlay process.
#[derive(Debug, Clone)]
pub enum OverlayUpdate {
    /// Overlay process status has changed.
    Status(OverlayStatus),
    /// A signal activation pass has completed.
    Activation(ActivationReport),
    /// A reconciliation pass has completed.
    Reconciled(ReconciliationRecord),
}

impl From<OverlayStatus> for OverlayUpdate {
    fn from(value: OverlayStatus) -> Self {
        Self::Status(value)
    }
}

pub(crate) type OverlayTransmitter = broadcast::Sender<OverlayUpdate>;

/// Receiver for subscribing to [`OverlayUpdate`]s.
pub type OverlayReceiver = broadcast::Receiver<OverlayUpdate>;

/// Trait for reading the overlay process status and subscribing to updates.
///
/// Provides a read-only interface to the overlay process state without the ability to control it.
pub trait OverlayReader: Send + Sync + 'static {
    /// Creates a new [`OverlayReceiver`] for subscribing to overlay updates.
    fn update_receiver(&self) -> OverlayReceiver;

    /// Returns the current [`OverlayStatus`] as a snapshot.
    fn status_snapshot(&self) -> OverlayStatus;

    /// Returns the believed [`DisplayState`] as a snapshot.
    fn display_snapshot(&self) -> DisplayState;
}

#[derive(Debug)]
struct OverlaySnapshot {
    status: OverlayStatus,
    display: DisplayState,
}

#[derive(Debug)]
pub(crate) struct OverlayStatusManager {
    snapshot: Mutex<OverlaySnapshot>,
    update_tx: OverlayTransmitter,
}

impl OverlayStatusManager {
    pub fn new(update_tx: OverlayTransmitter) -> Arc<Self> {
        let snapshot = Mutex::new(OverlaySnapshot {
            status: OverlayStatusNotRunning::NotInitiated.into(),
            display: DisplayState::Hidden,
        });

        Arc::new(Self {
            snapshot,
            update_tx,
        })
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, OverlaySnapshot> {
        self.snapshot
            .lock()
            .expect("`OverlayStatusManager` mutex can't be poisoned")
    }

    pub fn update(&self, new_status: OverlayStatus) {
        let mut snapshot_guard = self.lock_snapshot();
        snapshot_guard.status = new_status.clone();
        drop(snapshot_guard);

        // Ignore no-receivers errors
        let _ = self.update_tx.send(new_status.into());
    }

    pub fn activation(&self, report: ActivationReport) {
        let _ = self.update_tx.send(OverlayUpdate::Activation(report));
    }

    pub fn reconciled(&self, record: ReconciliationRecord) {
        let mut snapshot_guard = self.lock_snapshot();
        snapshot_guard.display = record.display_state();
        drop(snapshot_guard);

        let _ = self.update_tx.send(OverlayUpdate::Reconciled(record));
    }
}

impl OverlayReader for OverlayStatusManager {
    fn update_receiver(&self) -> OverlayReceiver {
        self.update_tx.subscribe()
    }

    fn status_snapshot(&self) -> OverlayStatus {
        self.lock_snapshot().status.clone()
    }

    fn display_snapshot(&self) -> DisplayState {
        self.lock_snapshot().display
    }
}
