mod config;
mod engine;
pub(crate) mod error;
pub(crate) mod process;
mod state;

pub use config::OverlayConfig;
pub use engine::{OverlayController, OverlayEngine};
pub use state::{
    OverlayReader, OverlayReceiver, OverlayStatus, OverlayStatusNotRunning, OverlayUpdate,
    ReconciliationRecord,
};
