use std::{future::Future, sync::Arc};

use futures::future;
use strum::IntoEnumIterator;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::device::{
    DeviceSetting, RoomDevice, SignalSource, SignalValue,
    error::{DeviceError, DeviceResult},
};

use super::{
    core::{ApiReference, SignalListener, SignalName, SignalNotificationTransmitter},
    error::{ActivationResult, SignalActivationError},
};

/// Device setting that must be enabled for people counts to be reported outside of calls.
pub const PEOPLE_COUNT_OUT_OF_CALL: &str = "RoomAnalytics PeopleCountOutOfCall";

const SETTING_ENABLED: &str = "On";

/// Registration state of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Unregistered,
    Registered,
    /// The registration request timed out. The device may still have accepted the listener, so
    /// the entry is never registered again.
    Unconfirmed,
}

struct SettingPrecondition {
    name: &'static str,
    required: &'static str,
    setting: Arc<dyn DeviceSetting>,
}

impl SettingPrecondition {
    async fn enforce(&self, signal: SignalName, timeout: time::Duration) -> ActivationResult<()> {
        let to_err = |source| SignalActivationError::Precondition {
            signal,
            setting: self.name,
            source,
        };

        let current = device_request(
            signal,
            "precondition read",
            timeout,
            self.setting.get(),
            to_err,
        )
        .await?;

        if current != self.required {
            warn!("Setting xConfig {} to {}", self.name, self.required);

            device_request(
                signal,
                "precondition write",
                timeout,
                self.setting.set(self.required),
                to_err,
            )
            .await?;
        }

        Ok(())
    }
}

async fn device_request<T>(
    signal: SignalName,
    stage: &'static str,
    timeout: time::Duration,
    request: impl Future<Output = DeviceResult<T>>,
    to_err: impl FnOnce(DeviceError) -> SignalActivationError,
) -> ActivationResult<T> {
    time::timeout(timeout, request)
        .await
        .map_err(|_| SignalActivationError::Timeout { signal, stage })?
        .map_err(to_err)
}

/// A signal whose listener was registered during an activation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivatedSignal {
    signal: SignalName,
    initial: Option<SignalValue>,
}

impl ActivatedSignal {
    pub fn signal(&self) -> SignalName {
        self.signal
    }

    /// Returns the value read on activation, or `None` if the initial read failed.
    pub fn initial(&self) -> Option<SignalValue> {
        self.initial
    }

    /// Returns the device API references of the signal, for diagnostics.
    pub fn references(&self) -> Vec<ApiReference> {
        self.signal
            .api_paths()
            .iter()
            .map(|key| ApiReference::from_key(key))
            .collect()
    }
}

/// Outcome of an activation pass.
///
/// Activations are independent, so one report can carry both activated signals and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    activated: Vec<ActivatedSignal>,
    readings: Vec<(SignalName, SignalValue)>,
    errors: Vec<SignalActivationError>,
}

impl ActivationReport {
    /// Signals activated in this pass, in activation order.
    pub fn activated(&self) -> &[ActivatedSignal] {
        &self.activated
    }

    /// All errors of this pass, duplicates included.
    pub fn errors(&self) -> &[SignalActivationError] {
        &self.errors
    }

    /// Signals that were skipped because they were already active.
    pub fn skipped(&self) -> Vec<SignalName> {
        self.errors
            .iter()
            .filter(|e| e.is_duplicate())
            .map(|e| e.signal())
            .collect()
    }

    /// Errors other than duplicate activation attempts.
    pub fn failures(&self) -> Vec<&SignalActivationError> {
        self.errors.iter().filter(|e| !e.is_duplicate()).collect()
    }

    /// Values successfully read in this pass, including those of signals whose listener could
    /// not be registered.
    pub fn initial_readings(&self) -> impl Iterator<Item = (SignalName, SignalValue)> + '_ {
        self.readings.iter().copied()
    }

    /// Device API references of every activated signal.
    pub fn manifest(&self) -> Vec<ApiReference> {
        self.activated
            .iter()
            .flat_map(|a| a.references())
            .collect()
    }

    fn merge(&mut self, outcome: EntryActivation) {
        let EntryActivation {
            activated,
            reading,
            errors,
        } = outcome;

        self.activated.extend(activated);
        self.readings.extend(reading);
        self.errors.extend(errors);
    }
}

struct EntryActivation {
    activated: Option<ActivatedSignal>,
    reading: Option<(SignalName, SignalValue)>,
    errors: Vec<SignalActivationError>,
}

impl EntryActivation {
    fn refused(err: SignalActivationError) -> Self {
        warn!("{err}");
        Self {
            activated: None,
            reading: None,
            errors: vec![err],
        }
    }
}

struct SignalEntry {
    signal: SignalName,
    source: Arc<dyn SignalSource>,
    precondition: Option<SettingPrecondition>,
    registration: Registration,
}

impl SignalEntry {
    async fn activate(
        &mut self,
        tx: &SignalNotificationTransmitter,
        timeout: time::Duration,
    ) -> EntryActivation {
        let signal = self.signal;

        match self.registration {
            Registration::Unregistered => {}
            Registration::Registered => {
                return EntryActivation::refused(SignalActivationError::AlreadyActive(signal));
            }
            Registration::Unconfirmed => {
                return EntryActivation::refused(SignalActivationError::Unconfirmed(signal));
            }
        }

        let mut errors = Vec::new();

        if let Some(precondition) = &self.precondition
            && let Err(e) = precondition.enforce(signal, timeout).await
        {
            error!("{e}");
            errors.push(e);
        }

        let fetched = device_request(
            signal,
            "initial read",
            timeout,
            self.source.get(),
            |source| SignalActivationError::Fetch { signal, source },
        )
        .await;

        let initial = match fetched {
            Ok(value) => {
                debug!("[{signal}] initial value: {value}");
                Some(value)
            }
            Err(e) => {
                error!("{e}");
                errors.push(e);
                None
            }
        };

        let listener = SignalListener::new(signal, tx.clone());
        let registered = device_request(
            signal,
            "listener registration",
            timeout,
            self.source.on(listener),
            |source| SignalActivationError::Listen { signal, source },
        )
        .await;

        let activated = match registered {
            Ok(()) => {
                self.registration = Registration::Registered;
                debug!("[{signal}] listener registered");
                Some(ActivatedSignal { signal, initial })
            }
            Err(e) => {
                if matches!(e, SignalActivationError::Timeout { .. }) {
                    self.registration = Registration::Unconfirmed;
                }
                error!("{e}");
                errors.push(e);
                None
            }
        };

        EntryActivation {
            activated,
            reading: initial.map(|value| (signal, value)),
            errors,
        }
    }
}

/// Owns the one-shot subscriptions to every room state signal.
///
/// Each entry performs one initial read and registers one listener. Once registered, an entry
/// refuses further activations.
pub struct SignalRegistry {
    entries: Vec<SignalEntry>,
    notification_tx: SignalNotificationTransmitter,
    request_timeout: time::Duration,
}

impl SignalRegistry {
    pub(crate) fn new(
        device: &dyn RoomDevice,
        notification_tx: SignalNotificationTransmitter,
        request_timeout: time::Duration,
    ) -> Self {
        let mut entries: Vec<SignalEntry> = SignalName::iter()
            .map(|signal| {
                let precondition = match signal {
                    SignalName::PeoplePresent => Some(SettingPrecondition {
                        name: PEOPLE_COUNT_OUT_OF_CALL,
                        required: SETTING_ENABLED,
                        setting: device.people_count_out_of_call(),
                    }),
                    _ => None,
                };

                SignalEntry {
                    signal,
                    source: device.signal_source(signal),
                    precondition,
                    registration: Registration::Unregistered,
                }
            })
            .collect();

        entries.sort_by_key(|entry| entry.signal.key());

        Self {
            entries,
            notification_tx,
            request_timeout,
        }
    }

    /// Returns the registration state of `signal`.
    pub fn registration(&self, signal: SignalName) -> Registration {
        self.entries
            .iter()
            .find(|entry| entry.signal == signal)
            .map(|entry| entry.registration)
            .unwrap_or(Registration::Unregistered)
    }

    /// Signals in activation order.
    pub fn signals(&self) -> Vec<SignalName> {
        self.entries.iter().map(|entry| entry.signal).collect()
    }

    /// Returns `true` if some entry failed to register its listener and can be activated again.
    pub fn has_unregistered(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.registration == Registration::Unregistered)
    }

    /// Activates a single signal.
    pub async fn activate(&mut self, signal: SignalName) -> ActivationReport {
        self.activate_where(|entry| entry.signal == signal).await
    }

    /// Activates every signal, in the lexicographic order of their keys.
    ///
    /// Activations run independently: a failing source does not block its siblings. Entries
    /// already registered are skipped with a warning.
    pub async fn activate_all(&mut self) -> ActivationReport {
        debug!("Starting subscriptions...");

        self.activate_where(|_| true).await
    }

    /// Activates the entries whose listener registration was rejected, without touching registered
    /// or unconfirmed entries.
    pub async fn retry_unregistered(&mut self) -> ActivationReport {
        debug!("Retrying rejected subscriptions...");

        self.activate_where(|entry| entry.registration == Registration::Unregistered)
            .await
    }

    async fn activate_where(&mut self, select: impl Fn(&SignalEntry) -> bool) -> ActivationReport {
        let tx = &self.notification_tx;
        let timeout = self.request_timeout;

        let outcomes = future::join_all(
            self.entries
                .iter_mut()
                .filter(|entry| select(entry))
                .map(|entry| entry.activate(tx, timeout)),
        )
        .await;

        let mut report = ActivationReport::default();
        for outcome in outcomes {
            report.merge(outcome);
        }

        if !report.activated.is_empty() {
            info!(
                "[{}] Subscriptions set || Subscriptions list:",
                report.activated.len()
            );
            for reference in report.manifest() {
                info!("xAPI: {}", reference.path);
                info!(" ↳ Url: {}", reference.url);
            }
        }

        report
    }
}
