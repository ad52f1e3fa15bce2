use crate::{
    device::{
        SignalValue,
        mock::{MockDevice, MockFailure, SinkCommand},
    },
    display::{DEFAULT_PAGE_URL, Reconciliation, WebSourceConfig},
    overlay::ReconciliationRecord,
    signal::{ActivationReport, SignalName, error::SignalActivationError},
};

use super::*;

async fn next_update(rx: &mut OverlayReceiver) -> OverlayUpdate {
    time::timeout(time::Duration::from_secs(5), rx.recv())
        .await
        .expect("update within timeout")
        .expect("update channel open")
}

async fn until_running(rx: &mut OverlayReceiver) -> (ActivationReport, ReconciliationRecord) {
    let mut report = None;
    let mut initial = None;

    loop {
        match next_update(rx).await {
            OverlayUpdate::Activation(r) => report = Some(r),
            OverlayUpdate::Reconciled(record) => initial = Some(record),
            OverlayUpdate::Status(OverlayStatus::Running) => break,
            OverlayUpdate::Status(_) => {}
        }
    }

    (
        report.expect("activation report before running"),
        initial.expect("initial reconciliation before running"),
    )
}

async fn next_reconciliation(rx: &mut OverlayReceiver) -> ReconciliationRecord {
    loop {
        if let OverlayUpdate::Reconciled(record) = next_update(rx).await {
            return record;
        }
    }
}

fn display(url: &str) -> SinkCommand {
    SinkCommand::Display(url.to_string())
}

#[tokio::test]
async fn start_activates_signals_and_reconciles_once() {
    let device = MockDevice::new();
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(3));

    let engine = OverlayEngine::new(OverlayConfig::default(), device.clone());
    assert!(matches!(
        engine.status_snapshot(),
        OverlayStatus::NotRunning(_)
    ));

    let mut rx = engine.update_receiver();
    let controller = engine.start();

    let (report, initial) = until_running(&mut rx).await;

    assert_eq!(report.activated().len(), 4);
    assert!(report.errors().is_empty());
    assert_eq!(initial.reconciliation(), &Reconciliation::Shown);
    assert!(initial.signals().people_present());

    assert!(matches!(controller.status_snapshot(), OverlayStatus::Running));
    assert_eq!(controller.display_snapshot(), DisplayState::Shown);
    assert_eq!(device.sink().actions(), vec![display(DEFAULT_PAGE_URL)]);
    assert_eq!(device.setting().value(), "On");

    for signal in [
        SignalName::CallActive,
        SignalName::PresentationPreview,
        SignalName::PresentationLive,
        SignalName::PeoplePresent,
    ] {
        assert_eq!(device.source(signal).fetches(), 1);
        assert_eq!(device.source(signal).registrations(), 1);
    }

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn notifications_drive_show_and_hide() {
    let device = MockDevice::new();

    let engine = OverlayEngine::new(OverlayConfig::default(), device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    let (_, initial) = until_running(&mut rx).await;
    assert_eq!(
        initial.reconciliation(),
        &Reconciliation::Unchanged(DisplayState::Hidden)
    );

    let people = device.source(SignalName::PeoplePresent);
    let calls = device.source(SignalName::CallActive);

    people.emit(SignalValue::Count(3));
    let record = next_reconciliation(&mut rx).await;
    assert_eq!(record.reconciliation(), &Reconciliation::Shown);

    calls.emit(SignalValue::Count(1));
    let record = next_reconciliation(&mut rx).await;
    assert_eq!(record.reconciliation(), &Reconciliation::Hidden { cleared: 1 });
    assert!(record.signals().call_active());

    // Same value again, no further command
    calls.emit(SignalValue::Count(1));
    let record = next_reconciliation(&mut rx).await;
    assert_eq!(
        record.reconciliation(),
        &Reconciliation::Unchanged(DisplayState::Hidden)
    );

    calls.emit(SignalValue::Count(0));
    let record = next_reconciliation(&mut rx).await;
    assert_eq!(record.reconciliation(), &Reconciliation::Shown);
    assert_eq!(controller.display_snapshot(), DisplayState::Shown);

    assert_eq!(
        device.sink().actions(),
        vec![
            display(DEFAULT_PAGE_URL),
            SinkCommand::Clear,
            display(DEFAULT_PAGE_URL),
        ]
    );

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn custom_url_is_shown_verbatim() {
    let url = "https://intranet.example.com/welcome";
    let device = MockDevice::new();
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(1));

    let config = OverlayConfig::from(
        WebSourceConfig::default()
            .with_use_default_page(false)
            .with_custom_url(url),
    );

    let engine = OverlayEngine::new(config, device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    until_running(&mut rx).await;

    assert_eq!(device.sink().actions(), vec![display(url)]);

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_read_does_not_stop_the_overlay() {
    let device = MockDevice::new();
    device
        .source(SignalName::CallActive)
        .fail_get(Some(MockFailure::unreachable()));
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(2));

    let engine = OverlayEngine::new(OverlayConfig::default(), device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    let (report, initial) = until_running(&mut rx).await;

    assert!(matches!(
        report.failures()[0],
        SignalActivationError::Fetch {
            signal: SignalName::CallActive,
            ..
        }
    ));
    assert_eq!(initial.reconciliation(), &Reconciliation::Shown);

    // The call signal still reports later changes
    device
        .source(SignalName::CallActive)
        .emit(SignalValue::Count(1));
    let record = next_reconciliation(&mut rx).await;
    assert_eq!(record.display_state(), DisplayState::Hidden);

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn rejected_listener_still_vetoes_with_its_initial_reading() {
    let device = MockDevice::new();
    let calls = device.source(SignalName::CallActive);
    calls.set_value(SignalValue::Count(1));
    calls.fail_on(Some(MockFailure::unreachable()));
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(3));

    let config = OverlayConfig::default().with_registration_retries(0);
    let engine = OverlayEngine::new(config, device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    let (report, initial) = until_running(&mut rx).await;

    assert!(matches!(
        report.failures().as_slice(),
        [SignalActivationError::Listen {
            signal: SignalName::CallActive,
            ..
        }]
    ));
    assert!(initial.signals().call_active());
    assert_eq!(
        initial.reconciliation(),
        &Reconciliation::Unchanged(DisplayState::Hidden)
    );
    assert!(device.sink().actions().is_empty());

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_listener_is_registered_on_retry() {
    let device = MockDevice::new();
    let calls = device.source(SignalName::CallActive);
    calls.set_value(SignalValue::Count(1));
    calls.fail_on(Some(MockFailure::unreachable()));
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(3));

    let config = OverlayConfig::default().with_registration_retry_interval(1);
    let engine = OverlayEngine::new(config, device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    until_running(&mut rx).await;
    assert_eq!(calls.registrations(), 0);

    calls.fail_on(None);

    let report = loop {
        if let OverlayUpdate::Activation(report) = next_update(&mut rx).await {
            break report;
        }
    };

    let activated: Vec<_> = report.activated().iter().map(|a| a.signal()).collect();
    assert_eq!(activated, vec![SignalName::CallActive]);
    assert_eq!(calls.registrations(), 1);
    assert_eq!(device.source(SignalName::PeoplePresent).fetches(), 1);

    // The call signal is now monitored
    calls.emit(SignalValue::Count(0));
    let record = loop {
        let record = next_reconciliation(&mut rx).await;
        if record.reconciliation().is_transition() {
            break record;
        }
    };
    assert_eq!(record.reconciliation(), &Reconciliation::Shown);

    controller.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn timed_out_listener_is_not_registered_again() {
    let device = MockDevice::new();
    let calls = device.source(SignalName::CallActive);
    calls.fail_on(Some(MockFailure::Hang));

    let config = OverlayConfig::default()
        .with_device_request_timeout(1)
        .with_registration_retry_interval(1);
    let engine = OverlayEngine::new(config, device.clone());
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    let (report, _) = until_running(&mut rx).await;
    assert!(matches!(
        report.failures().as_slice(),
        [SignalActivationError::Timeout {
            signal: SignalName::CallActive,
            stage: "listener registration",
        }]
    ));

    calls.fail_on(None);
    time::sleep(time::Duration::from_secs(10)).await;

    assert_eq!(calls.fetches(), 1);
    assert_eq!(calls.registrations(), 0);
    assert!(matches!(controller.status_snapshot(), OverlayStatus::Running));

    controller.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_can_only_be_requested_once() {
    let device = MockDevice::new();

    let engine = OverlayEngine::new(OverlayConfig::default(), device);
    let mut rx = engine.update_receiver();
    let controller = engine.start();

    until_running(&mut rx).await;

    controller.shutdown().await.unwrap();
    assert!(matches!(controller.status_snapshot(), OverlayStatus::Shutdown));
    assert!(matches!(
        controller.until_stopped().await,
        OverlayStatus::Shutdown
    ));

    assert!(matches!(
        controller.shutdown().await,
        Err(OverlayError::OverlayAlreadyShutdown)
    ));
}

#[tokio::test]
async fn reader_reflects_controller_state() {
    let device = MockDevice::new();
    device
        .source(SignalName::PeoplePresent)
        .set_value(SignalValue::Count(5));

    let engine = OverlayEngine::new(OverlayConfig::default(), device);
    let reader = engine.reader();
    let mut rx = reader.update_receiver();
    let controller = engine.start();

    until_running(&mut rx).await;

    assert!(matches!(reader.status_snapshot(), OverlayStatus::Running));
    assert_eq!(reader.display_snapshot(), DisplayState::Shown);

    controller.shutdown().await.unwrap();
    assert!(reader.status_snapshot().is_stopped());
}
