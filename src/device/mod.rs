use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    display::OverlayTarget,
    signal::{SignalListener, SignalName},
};

pub(crate) mod error;
#[cfg(test)]
pub(crate) mod mock;

use error::DeviceResult;

/// Current value of a device signal, as reported by the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalValue {
    /// Counter-like status, such as the number of active calls or people in the room. Devices
    /// report `-1` when the count is unavailable.
    Count(i64),
    /// Flag-like status, such as a presentation having started or stopped.
    Flag(bool),
}

impl SignalValue {
    /// Returns `true` if the value represents an active signal.
    ///
    /// Counts are active when strictly positive, flags when set.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Count(count) => *count > 0,
            Self::Flag(flag) => *flag,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Visibility of a web view page on the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebViewStatus {
    Visible,
    NotVisible,
    Error,
}

/// A web view page currently held by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebViewPage {
    pub url: String,
    pub status: WebViewStatus,
}

impl WebViewPage {
    pub fn new(url: impl Into<String>, status: WebViewStatus) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    /// Returns `true` if this page shows `url` in the foreground.
    pub fn is_visible_with_url(&self, url: &str) -> bool {
        self.status == WebViewStatus::Visible && self.url == url
    }
}

/// An externally owned source of room state.
///
/// Implementations wrap a device status or event pair. [`get`](Self::get) performs a one-shot read
/// and [`on`](Self::on) registers a durable listener that must be notified on every later change.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn get(&self) -> DeviceResult<SignalValue>;

    async fn on(&self, listener: SignalListener) -> DeviceResult<()>;
}

/// A device configuration value that can be read and written.
#[async_trait]
pub trait DeviceSetting: Send + Sync {
    async fn get(&self) -> DeviceResult<String>;

    async fn set(&self, value: &str) -> DeviceResult<()>;
}

/// The device screen surface used to show and hide the overlay page.
#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Shows the given target in the foreground.
    async fn display(&self, target: &OverlayTarget) -> DeviceResult<()>;

    /// Clears the foreground web view.
    async fn clear(&self) -> DeviceResult<()>;

    /// Lists the web view pages currently held by the device.
    async fn list_visible(&self) -> DeviceResult<Vec<WebViewPage>>;
}

/// Entry point to the device API, handing out the collaborators the overlay process needs.
pub trait RoomDevice: Send + Sync + 'static {
    /// Returns the source backing `signal`.
    fn signal_source(&self, signal: SignalName) -> Arc<dyn SignalSource>;

    /// Returns the setting that enables people counting outside of calls.
    fn people_count_out_of_call(&self) -> Arc<dyn DeviceSetting>;

    fn display_sink(&self) -> Arc<dyn DisplaySink>;
}
