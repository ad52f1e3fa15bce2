use std::fmt;

use strum::EnumIter;
use tokio::sync::mpsc;

use crate::device::SignalValue;

const XAPI_REFERENCE_BASE: &str = "https://roomos.cisco.com/xapi/";

/// The room state signals that drive the overlay decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum SignalName {
    /// Number of active calls on the device. Vetoes the overlay when positive.
    CallActive,
    /// Local presentation preview. Vetoes the overlay while running.
    PresentationPreview,
    /// Presentation shared in a call. Vetoes the overlay while running.
    PresentationLive,
    /// Current people count reported by room analytics.
    PeoplePresent,
}

impl SignalName {
    /// Returns the device API key of this signal.
    ///
    /// Registry activation follows the lexicographic order of these keys.
    pub fn key(&self) -> &'static str {
        self.api_paths()[0]
    }

    /// Returns every device API path the signal listens on.
    ///
    /// Event based signals are backed by a started/stopped pair.
    pub fn api_paths(&self) -> &'static [&'static str] {
        match self {
            Self::CallActive => &["xStatus_SystemUnit_State_NumberOfActiveCalls"],
            Self::PresentationPreview => &[
                "xEvent_PresentationPreviewStarted",
                "xEvent_PresentationPreviewStopped",
            ],
            Self::PresentationLive => &["xEvent_PresentationStarted", "xEvent_PresentationStopped"],
            Self::PeoplePresent => &["xStatus_RoomAnalytics_PeopleCount_Current"],
        }
    }

    /// Returns `true` if the active state of this signal forces the overlay hidden.
    pub fn is_veto(&self) -> bool {
        !matches!(self, Self::PeoplePresent)
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallActive => write!(f, "Call active"),
            Self::PresentationPreview => write!(f, "Presentation preview"),
            Self::PresentationLive => write!(f, "Presentation live"),
            Self::PeoplePresent => write!(f, "People present"),
        }
    }
}

/// Diagnostic description of a device API path, with its public reference link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReference {
    pub path: String,
    pub url: String,
}

impl ApiReference {
    pub(crate) fn from_key(key: &str) -> Self {
        let path = key.replace('_', " ");
        let url = format!(
            "{XAPI_REFERENCE_BASE}{}",
            key.strip_prefix('x').unwrap_or(key).replace('_', ".")
        );

        Self { path, url }
    }
}

impl fmt::Display for ApiReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.url)
    }
}

/// Aggregated room state. Every signal is inactive until its first successful read or
/// notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalState {
    call_active: bool,
    presentation_preview: bool,
    presentation_live: bool,
    people_present: bool,
}

impl SignalState {
    pub fn new(
        call_active: bool,
        presentation_preview: bool,
        presentation_live: bool,
        people_present: bool,
    ) -> Self {
        Self {
            call_active,
            presentation_preview,
            presentation_live,
            people_present,
        }
    }

    pub fn call_active(&self) -> bool {
        self.call_active
    }

    pub fn presentation_preview(&self) -> bool {
        self.presentation_preview
    }

    pub fn presentation_live(&self) -> bool {
        self.presentation_live
    }

    pub fn people_present(&self) -> bool {
        self.people_present
    }

    pub fn get(&self, signal: SignalName) -> bool {
        match signal {
            SignalName::CallActive => self.call_active,
            SignalName::PresentationPreview => self.presentation_preview,
            SignalName::PresentationLive => self.presentation_live,
            SignalName::PeoplePresent => self.people_present,
        }
    }

    /// Sets the field owned by `signal`. Returns `true` if the stored value changed.
    pub(crate) fn set(&mut self, signal: SignalName, active: bool) -> bool {
        let field = match signal {
            SignalName::CallActive => &mut self.call_active,
            SignalName::PresentationPreview => &mut self.presentation_preview,
            SignalName::PresentationLive => &mut self.presentation_live,
            SignalName::PeoplePresent => &mut self.people_present,
        };

        let changed = *field != active;
        *field = active;
        changed
    }

    /// Returns `true` if any veto signal is active.
    pub fn is_vetoed(&self) -> bool {
        self.call_active || self.presentation_preview || self.presentation_live
    }

    /// Returns `true` if the overlay should be shown: people are present and no veto is active.
    pub fn should_display(&self) -> bool {
        self.people_present && !self.is_vetoed()
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call: {}, preview: {}, live: {}, people: {}",
            self.call_active, self.presentation_preview, self.presentation_live, self.people_present
        )
    }
}

/// A change of one signal, delivered by a [`SignalSource`](crate::device::SignalSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalNotification {
    pub signal: SignalName,
    pub value: SignalValue,
}

impl SignalNotification {
    pub fn new(signal: SignalName, value: SignalValue) -> Self {
        Self { signal, value }
    }
}

impl fmt::Display for SignalNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.signal, self.value)
    }
}

pub(crate) type SignalNotificationTransmitter = mpsc::UnboundedSender<SignalNotification>;
pub(crate) type SignalNotificationReceiver = mpsc::UnboundedReceiver<SignalNotification>;

/// Durable change handler handed to [`SignalSource::on`](crate::device::SignalSource::on).
///
/// Every listener feeds the same queue, so notifications are handled one at a time in the order
/// the device delivers them.
#[derive(Debug, Clone)]
pub struct SignalListener {
    signal: SignalName,
    tx: SignalNotificationTransmitter,
}

impl SignalListener {
    pub(crate) fn new(signal: SignalName, tx: SignalNotificationTransmitter) -> Self {
        Self { signal, tx }
    }

    /// Returns the signal this listener is bound to.
    pub fn signal(&self) -> SignalName {
        self.signal
    }

    /// Forwards a new value of the signal.
    ///
    /// Returns `false` if the overlay process is no longer running.
    pub fn notify(&self, value: SignalValue) -> bool {
        self.tx
            .send(SignalNotification::new(self.signal, value))
            .is_ok()
    }
}
