use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use futures::future;
use strum::IntoEnumIterator;

use crate::{
    display::OverlayTarget,
    signal::{SignalListener, SignalName},
};

use super::{
    DeviceSetting, DisplaySink, RoomDevice, SignalSource, SignalValue, WebViewPage, WebViewStatus,
    error::{DeviceError, DeviceResult},
};

#[derive(Debug, Clone)]
pub enum MockFailure {
    Error(DeviceError),
    Hang,
}

impl MockFailure {
    pub fn unreachable() -> Self {
        Self::Error(DeviceError::Unreachable("mock".to_string()))
    }

    async fn fail<T>(&self) -> DeviceResult<T> {
        match self {
            Self::Error(e) => Err(e.clone()),
            Self::Hang => future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand {
    Display(String),
    Clear,
    ListVisible,
}

pub struct MockSignalSource {
    value: Mutex<SignalValue>,
    fetches: AtomicUsize,
    listeners: Mutex<Vec<SignalListener>>,
    get_failure: Mutex<Option<MockFailure>>,
    on_failure: Mutex<Option<MockFailure>>,
}

impl MockSignalSource {
    fn new(value: SignalValue) -> Self {
        Self {
            value: Mutex::new(value),
            fetches: AtomicUsize::new(0),
            listeners: Mutex::new(Vec::new()),
            get_failure: Mutex::new(None),
            on_failure: Mutex::new(None),
        }
    }

    pub fn set_value(&self, value: SignalValue) {
        *self.value.lock().unwrap() = value;
    }

    /// Updates the value and notifies every registered listener.
    pub fn emit(&self, value: SignalValue) {
        self.set_value(value);
        for listener in self.listeners.lock().unwrap().iter() {
            listener.notify(value);
        }
    }

    pub fn fail_get(&self, failure: Option<MockFailure>) {
        *self.get_failure.lock().unwrap() = failure;
    }

    pub fn fail_on(&self, failure: Option<MockFailure>) {
        *self.on_failure.lock().unwrap() = failure;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn registrations(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

#[async_trait]
impl SignalSource for MockSignalSource {
    async fn get(&self) -> DeviceResult<SignalValue> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let failure = self.get_failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return failure.fail().await;
        }

        Ok(*self.value.lock().unwrap())
    }

    async fn on(&self, listener: SignalListener) -> DeviceResult<()> {
        let failure = self.on_failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return failure.fail().await;
        }

        self.listeners.lock().unwrap().push(listener);
        Ok(())
    }
}

pub struct MockSetting {
    value: Mutex<String>,
    writes: Mutex<Vec<String>>,
    failure: Mutex<Option<MockFailure>>,
}

impl MockSetting {
    pub fn set_value(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }

    pub fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn fail(&self, failure: Option<MockFailure>) {
        *self.failure.lock().unwrap() = failure;
    }
}

#[async_trait]
impl DeviceSetting for MockSetting {
    async fn get(&self) -> DeviceResult<String> {
        let failure = self.failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return failure.fail().await;
        }

        Ok(self.value())
    }

    async fn set(&self, value: &str) -> DeviceResult<()> {
        self.writes.lock().unwrap().push(value.to_string());
        self.set_value(value);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDisplaySink {
    commands: Mutex<Vec<SinkCommand>>,
    pages: Mutex<Vec<WebViewPage>>,
    display_failure: Mutex<Option<MockFailure>>,
    clear_failure: Mutex<Option<MockFailure>>,
}

impl MockDisplaySink {
    pub fn commands(&self) -> Vec<SinkCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Commands that change the screen, without `ListVisible` queries.
    pub fn actions(&self) -> Vec<SinkCommand> {
        self.commands()
            .into_iter()
            .filter(|c| *c != SinkCommand::ListVisible)
            .collect()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    pub fn set_pages(&self, pages: Vec<WebViewPage>) {
        *self.pages.lock().unwrap() = pages;
    }

    pub fn pages(&self) -> Vec<WebViewPage> {
        self.pages.lock().unwrap().clone()
    }

    pub fn fail_display(&self, failure: Option<MockFailure>) {
        *self.display_failure.lock().unwrap() = failure;
    }

    pub fn fail_clear(&self, failure: Option<MockFailure>) {
        *self.clear_failure.lock().unwrap() = failure;
    }

    fn record(&self, command: SinkCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

#[async_trait]
impl DisplaySink for MockDisplaySink {
    async fn display(&self, target: &OverlayTarget) -> DeviceResult<()> {
        self.record(SinkCommand::Display(target.url().to_string()));

        let failure = self.display_failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return failure.fail().await;
        }

        self.set_pages(vec![WebViewPage::new(target.url(), WebViewStatus::Visible)]);
        Ok(())
    }

    async fn clear(&self) -> DeviceResult<()> {
        self.record(SinkCommand::Clear);

        let failure = self.clear_failure.lock().unwrap().clone();
        if let Some(failure) = failure {
            return failure.fail().await;
        }

        self.pages.lock().unwrap().clear();
        Ok(())
    }

    async fn list_visible(&self) -> DeviceResult<Vec<WebViewPage>> {
        self.record(SinkCommand::ListVisible);
        Ok(self.pages())
    }
}

pub struct MockDevice {
    sources: HashMap<SignalName, Arc<MockSignalSource>>,
    setting: Arc<MockSetting>,
    sink: Arc<MockDisplaySink>,
}

impl MockDevice {
    /// Creates a device with no calls, no presentations, nobody in the room, and people counting
    /// disabled outside of calls.
    pub fn new() -> Arc<Self> {
        let sources = SignalName::iter()
            .map(|signal| {
                let value = match signal {
                    SignalName::CallActive => SignalValue::Count(0),
                    SignalName::PeoplePresent => SignalValue::Count(-1),
                    SignalName::PresentationPreview | SignalName::PresentationLive => {
                        SignalValue::Flag(false)
                    }
                };
                (signal, Arc::new(MockSignalSource::new(value)))
            })
            .collect();

        let setting = Arc::new(MockSetting {
            value: Mutex::new("Off".to_string()),
            writes: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        });

        Arc::new(Self {
            sources,
            setting,
            sink: Arc::new(MockDisplaySink::default()),
        })
    }

    pub fn source(&self, signal: SignalName) -> &MockSignalSource {
        &self.sources[&signal]
    }

    pub fn setting(&self) -> &MockSetting {
        &self.setting
    }

    pub fn sink(&self) -> &MockDisplaySink {
        &self.sink
    }
}

impl RoomDevice for MockDevice {
    fn signal_source(&self, signal: SignalName) -> Arc<dyn SignalSource> {
        self.sources[&signal].clone()
    }

    fn people_count_out_of_call(&self) -> Arc<dyn DeviceSetting> {
        self.setting.clone()
    }

    fn display_sink(&self) -> Arc<dyn DisplaySink> {
        self.sink.clone()
    }
}
