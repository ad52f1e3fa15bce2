#![doc = include_str!("../README.md")]

/// Exports the [`RoomDevice`] interfaces the overlay needs from the device API.
///
/// [`RoomDevice`]: crate::device::RoomDevice
pub mod device;
/// Exports [`DisplayDecisionEngine`], [`OverlayTarget`] and other types related to the display
/// decision.
///
/// [`DisplayDecisionEngine`]: crate::display::DisplayDecisionEngine
/// [`OverlayTarget`]: crate::display::OverlayTarget
pub mod display;
pub mod logging;
/// Exports [`OverlayEngine`], [`OverlayController`] and other types related to running the
/// overlay process.
///
/// [`OverlayEngine`]: crate::overlay::OverlayEngine
/// [`OverlayController`]: crate::overlay::OverlayController
pub mod overlay;
/// Exports [`SignalRegistry`], [`SignalState`] and other types related to room state signals.
///
/// [`SignalRegistry`]: crate::signal::SignalRegistry
/// [`SignalState`]: crate::signal::SignalState
pub mod signal;
mod util;

/// Error types returned by `presence-overlay`.
pub mod error {
    pub use super::device::error::{DeviceError, DeviceResult};
    pub use super::display::error::DisplayCommandError;
    pub use super::overlay::{error::OverlayError, process::error::OverlayProcessFatalError};
    pub use super::signal::error::SignalActivationError;

    /// Convenience general-purpose Result type alias.
    pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
}

/// Exports the value types shared across modules.
pub mod models {
    pub use super::device::{SignalValue, WebViewPage, WebViewStatus};
    pub use super::display::{DisplayState, OverlayTarget, Reconciliation, WebSourceConfig};
    pub use super::signal::{SignalName, SignalNotification, SignalState};
}
