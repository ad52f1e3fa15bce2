use std::num::NonZeroUsize;

use tokio::time;

use crate::display::{OverlayTarget, WebSourceConfig};

/// Configuration for the overlay engine.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    web_source: WebSourceConfig,
    device_request_timeout: time::Duration,
    registration_retry_interval: time::Duration,
    registration_retries: u32,
    shutdown_timeout: time::Duration,
    update_channel_capacity: NonZeroUsize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            web_source: WebSourceConfig::default(),
            device_request_timeout: time::Duration::from_secs(10),
            registration_retry_interval: time::Duration::from_secs(30),
            registration_retries: 3,
            shutdown_timeout: time::Duration::from_secs(6),
            update_channel_capacity: 100.try_into().expect("not zero"),
        }
    }
}

impl OverlayConfig {
    /// Returns the options selecting the overlay page.
    pub fn web_source(&self) -> &WebSourceConfig {
        &self.web_source
    }

    /// Returns the timeout applied to every device request (setting access, signal read,
    /// listener registration and display command).
    pub fn device_request_timeout(&self) -> time::Duration {
        self.device_request_timeout
    }

    /// Returns the delay between attempts to register rejected signal listeners.
    pub fn registration_retry_interval(&self) -> time::Duration {
        self.registration_retry_interval
    }

    /// Returns the maximum number of registration retry passes after startup.
    pub fn registration_retries(&self) -> u32 {
        self.registration_retries
    }

    /// Returns the timeout duration for graceful shutdown operations.
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }

    /// Returns the capacity of the update broadcast channel.
    pub fn update_channel_capacity(&self) -> NonZeroUsize {
        self.update_channel_capacity
    }

    /// Sets the options selecting the overlay page.
    ///
    /// Default: [`WebSourceConfig`] default
    pub fn with_web_source(mut self, web_source: WebSourceConfig) -> Self {
        self.web_source = web_source;
        self
    }

    /// Sets the timeout applied to every device request. Requests that time out are reported as
    /// failures. A timed-out listener registration is never retried, since the device may have
    /// accepted it.
    ///
    /// Default: `10` seconds
    pub fn with_device_request_timeout(mut self, secs: u64) -> Self {
        self.device_request_timeout = time::Duration::from_secs(secs);
        self
    }

    /// Sets the delay between attempts to register signal listeners the device rejected.
    ///
    /// Default: `30` seconds
    pub fn with_registration_retry_interval(mut self, secs: u64) -> Self {
        self.registration_retry_interval = time::Duration::from_secs(secs);
        self
    }

    /// Sets the maximum number of registration retry passes. `0` disables retries.
    ///
    /// Default: `3`
    pub fn with_registration_retries(mut self, retries: u32) -> Self {
        self.registration_retries = retries;
        self
    }

    /// Sets the timeout duration for graceful shutdown operations.
    ///
    /// Default: `6` seconds
    pub fn with_shutdown_timeout(mut self, secs: u64) -> Self {
        self.shutdown_timeout = time::Duration::from_secs(secs);
        self
    }

    /// Sets the capacity of the update broadcast channel.
    ///
    /// Default: `100`
    pub fn with_update_channel_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.update_channel_capacity = capacity;
        self
    }
}

impl From<WebSourceConfig> for OverlayConfig {
    fn from(web_source: WebSourceConfig) -> Self {
        Self::default().with_web_source(web_source)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct OverlayProcessConfig {
    target: OverlayTarget,
    device_request_timeout: time::Duration,
    registration_retry_interval: time::Duration,
    registration_retries: u32,
}

impl OverlayProcessConfig {
    pub fn target(&self) -> &OverlayTarget {
        &self.target
    }

    pub fn device_request_timeout(&self) -> time::Duration {
        self.device_request_timeout
    }

    pub fn registration_retry_interval(&self) -> time::Duration {
        self.registration_retry_interval
    }

    pub fn registration_retries(&self) -> u32 {
        self.registration_retries
    }
}

impl From<&OverlayConfig> for OverlayProcessConfig {
    fn from(value: &OverlayConfig) -> Self {
        Self {
            target: OverlayTarget::resolve(&value.web_source),
            device_request_timeout: value.device_request_timeout,
            registration_retry_interval: value.registration_retry_interval,
            registration_retries: value.registration_retries,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct OverlayControllerConfig {
    shutdown_timeout: time::Duration,
}

impl OverlayControllerConfig {
    pub fn shutdown_timeout(&self) -> time::Duration {
        self.shutdown_timeout
    }
}

impl From<&OverlayConfig> for OverlayControllerConfig {
    fn from(value: &OverlayConfig) -> Self {
        Self {
            shutdown_timeout: value.shutdown_timeout,
        }
    }
}
