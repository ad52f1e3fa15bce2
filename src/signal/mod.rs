mod core;
pub(crate) mod error;
mod registry;

pub use self::core::{ApiReference, SignalListener, SignalName, SignalNotification, SignalState};
pub(crate) use self::core::SignalNotificationReceiver;
pub use registry::{
    ActivatedSignal, ActivationReport, PEOPLE_COUNT_OUT_OF_CALL, Registration, SignalRegistry,
};
