use std::{fmt, future::Future, sync::Arc};

use tokio::time;
use tracing::{debug, error, info};

use crate::{
    device::{
        DisplaySink, SignalValue,
        error::{DeviceError, DeviceResult},
    },
    signal::{SignalName, SignalNotification, SignalState},
};

use super::{
    error::{DisplayCommandError, DisplayCommandResult},
    target::OverlayTarget,
};

/// Believed state of the overlay on the device screen.
///
/// This is a belief: the device window manager may replace the foreground content without
/// notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayState {
    #[default]
    Hidden,
    Shown,
}

impl DisplayState {
    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown)
    }
}

impl From<bool> for DisplayState {
    fn from(shown: bool) -> Self {
        if shown { Self::Shown } else { Self::Hidden }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hidden => write!(f, "Hidden"),
            Self::Shown => write!(f, "Shown"),
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The desired state already matched the believed state. No command was issued.
    Unchanged(DisplayState),
    /// The show command was issued.
    Shown,
    /// The overlay was hidden. `cleared` is the number of matching visible pages cleared, which
    /// is zero if the overlay had already been replaced on screen.
    Hidden { cleared: usize },
    /// A transition was attempted and its command failed. The believed state was updated anyway
    /// and is corrected by the next opposite transition.
    Failed {
        state: DisplayState,
        error: DisplayCommandError,
    },
}

impl Reconciliation {
    /// Returns the believed display state after this pass.
    pub fn state(&self) -> DisplayState {
        match self {
            Self::Unchanged(state) => *state,
            Self::Shown => DisplayState::Shown,
            Self::Hidden { .. } => DisplayState::Hidden,
            Self::Failed { state, .. } => *state,
        }
    }

    /// Returns `true` if this pass changed the believed display state.
    pub fn is_transition(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged(state) => write!(f, "Unchanged ({state})"),
            Self::Shown => write!(f, "Shown"),
            Self::Hidden { cleared } => write!(f, "Hidden ({cleared} page(s) cleared)"),
            Self::Failed { state, error } => write!(f, "Failed towards {state}: {error}"),
        }
    }
}

/// Aggregates the room state signals into a single show/hide decision and keeps the display
/// sink in line with it.
///
/// The engine is the only issuer of display commands, and only from [`reconcile`]. Every signal
/// mutation path ends in a `reconcile` call.
///
/// The believed [`DisplayState`] is updated when a command is issued, not when it succeeds. A
/// failed command leaves a stale belief, which the next opposite transition corrects. Commands are
/// not retried.
///
/// [`reconcile`]: Self::reconcile
pub struct DisplayDecisionEngine {
    signals: SignalState,
    display: DisplayState,
    target: OverlayTarget,
    sink: Arc<dyn DisplaySink>,
    request_timeout: time::Duration,
}

impl DisplayDecisionEngine {
    pub fn new(
        target: OverlayTarget,
        sink: Arc<dyn DisplaySink>,
        request_timeout: time::Duration,
    ) -> Self {
        Self {
            signals: SignalState::default(),
            display: DisplayState::Hidden,
            target,
            sink,
            request_timeout,
        }
    }

    /// Returns `true` iff people are present and no call, presentation preview or live
    /// presentation is active.
    pub fn evaluate(signals: &SignalState) -> bool {
        signals.should_display()
    }

    pub fn signals(&self) -> SignalState {
        self.signals
    }

    pub fn display_state(&self) -> DisplayState {
        self.display
    }

    pub fn target(&self) -> &OverlayTarget {
        &self.target
    }

    /// Stores an initial reading without reconciling.
    ///
    /// Used while signals are being activated; a single [`reconcile`](Self::reconcile) follows
    /// once every activation has completed.
    pub fn seed(&mut self, signal: SignalName, value: SignalValue) {
        self.signals.set(signal, value.is_active());
        debug!("[{signal}] seeded with {value}");
    }

    /// Applies a signal change and reconciles.
    pub async fn on_signal(&mut self, notification: SignalNotification) -> Reconciliation {
        let SignalNotification { signal, value } = notification;
        let changed = self.signals.set(signal, value.is_active());

        debug!(
            "[{signal}] notified with {value} (changed: {changed}), state: {}",
            self.signals
        );

        self.reconcile().await
    }

    /// Compares the desired display state with the believed one and issues at most one
    /// corrective transition.
    pub async fn reconcile(&mut self) -> Reconciliation {
        let desired = DisplayState::from(Self::evaluate(&self.signals));

        if desired == self.display {
            return Reconciliation::Unchanged(self.display);
        }

        self.display = desired;

        let result = match desired {
            DisplayState::Shown => self.show().await.map(|_| Reconciliation::Shown),
            DisplayState::Hidden => self
                .hide()
                .await
                .map(|cleared| Reconciliation::Hidden { cleared }),
        };

        result.unwrap_or_else(|error| {
            error!("Failed to reconcile overlay towards {desired}: {error}");
            Reconciliation::Failed {
                state: desired,
                error,
            }
        })
    }

    async fn show(&self) -> DisplayCommandResult<()> {
        self.target.warn_if_fallback();

        info!("Treat! Opening site > [{}]", self.target);

        self.sink_request("display", self.sink.display(&self.target), DisplayCommandError::Show)
            .await
    }

    async fn hide(&self) -> DisplayCommandResult<usize> {
        let pages = self
            .sink_request(
                "list visible",
                self.sink.list_visible(),
                DisplayCommandError::ListVisible,
            )
            .await?;

        let mut cleared = 0;
        for page in pages
            .iter()
            .filter(|page| page.is_visible_with_url(self.target.url()))
        {
            info!("Trick! Closing site > [{}]", page.url);

            self.sink_request("clear", self.sink.clear(), DisplayCommandError::Clear)
                .await?;
            cleared += 1;
        }

        if cleared == 0 {
            debug!("Overlay [{}] no longer visible, nothing to clear", self.target);
        }

        Ok(cleared)
    }

    async fn sink_request<T>(
        &self,
        stage: &'static str,
        request: impl Future<Output = DeviceResult<T>>,
        to_err: impl FnOnce(DeviceError) -> DisplayCommandError,
    ) -> DisplayCommandResult<T> {
        time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| DisplayCommandError::Timeout(stage))?
            .map_err(to_err)
    }
}
