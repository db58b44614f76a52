#![allow(clippy::unwrap_used)]
// SwitchMonitor behaviour on a paused clock with a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use pretty_assertions::assert_eq;

use panel_api::ActionResponse;
use panel_core::{
    CoreError, Indicator, LayerCatalog, LayerDescriptor, MonitorState, Phase, PollOutcome,
    ProgressFrame, SwitchBackend, SwitchMonitor, SwitchRequest, SwitchStatus, SwitchView,
};

const INTERVAL: Duration = Duration::from_secs(2);

// ── Fake backend ────────────────────────────────────────────────────

enum Step {
    Status(SwitchStatus),
    Unreachable,
    Expired,
}

#[derive(Default)]
struct FakeState {
    script: VecDeque<Step>,
    /// Returned once the script is exhausted.
    current: SwitchStatus,
    ack: Option<ActionResponse>,
    start_fails: bool,
    clear_fails: bool,
    start_calls: usize,
    status_calls: usize,
    clear_calls: usize,
}

#[derive(Clone, Default)]
struct FakePanel {
    state: Arc<Mutex<FakeState>>,
}

impl FakePanel {
    fn with_current(status: SwitchStatus) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().current = status;
        fake
    }

    fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.state.lock().unwrap().script.extend(steps);
    }

    fn reject_with(&self, message: &str) {
        self.state.lock().unwrap().ack = Some(ActionResponse {
            success: false,
            error: Some(message.into()),
            service: None,
        });
    }

    fn fail_starts(&self) {
        self.state.lock().unwrap().start_fails = true;
    }

    fn fail_clears(&self) {
        self.state.lock().unwrap().clear_fails = true;
    }

    fn start_calls(&self) -> usize {
        self.state.lock().unwrap().start_calls
    }

    fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    fn clear_calls(&self) -> usize {
        self.state.lock().unwrap().clear_calls
    }
}

fn unreachable() -> CoreError {
    CoreError::ConnectionFailed {
        url: "https://panel.test".into(),
        reason: "connection refused".into(),
    }
}

impl SwitchBackend for FakePanel {
    async fn list_layers(&self) -> Result<LayerCatalog, CoreError> {
        Ok(catalog())
    }

    async fn start_switch(&self, _request: &SwitchRequest) -> Result<ActionResponse, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.start_calls += 1;
        if state.start_fails {
            return Err(unreachable());
        }
        Ok(state.ack.clone().unwrap_or(ActionResponse {
            success: true,
            error: None,
            service: None,
        }))
    }

    async fn switch_status(&self) -> Result<SwitchStatus, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        match state.script.pop_front() {
            Some(Step::Status(status)) => {
                state.current = status.clone();
                Ok(status)
            }
            Some(Step::Unreachable) => Err(unreachable()),
            Some(Step::Expired) => Err(CoreError::SessionExpired),
            None => Ok(state.current.clone()),
        }
    }

    async fn clear_switch(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.clear_calls += 1;
        if state.clear_fails {
            return Err(unreachable());
        }
        state.current = SwitchStatus::default();
        Ok(())
    }
}

// ── Recording view ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Catalog,
    Progress,
    Frame(ProgressFrame),
    Error(String),
    SessionExpired,
}

#[derive(Clone, Default)]
struct RecordingView {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingView {
    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn frames(&self) -> Vec<ProgressFrame> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Frame(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn count(&self, wanted: &Event) -> usize {
        self.events().iter().filter(|e| *e == wanted).count()
    }
}

impl SwitchView for RecordingView {
    fn show_catalog(&self, _catalog: &LayerCatalog) {
        self.events.lock().unwrap().push(Event::Catalog);
    }

    fn show_progress(&self) {
        self.events.lock().unwrap().push(Event::Progress);
    }

    fn render(&self, frame: &ProgressFrame) {
        self.events.lock().unwrap().push(Event::Frame(frame.clone()));
    }

    fn show_error(&self, error: &CoreError) {
        self.events.lock().unwrap().push(Event::Error(error.to_string()));
    }

    fn session_expired(&self) {
        self.events.lock().unwrap().push(Event::SessionExpired);
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn v2ray() -> LayerDescriptor {
    LayerDescriptor {
        id: "layer7-v2ray".into(),
        name: "V2Ray WebSocket + TLS".into(),
        description: "VLESS over WebSocket behind nginx".into(),
        needs_domain: true,
        needs_duckdns: true,
    }
}

fn ssh() -> LayerDescriptor {
    LayerDescriptor {
        id: "layer4-ssh".into(),
        name: "SSH tunnel".into(),
        description: String::new(),
        needs_domain: false,
        needs_duckdns: false,
    }
}

fn catalog() -> LayerCatalog {
    LayerCatalog {
        current: "layer4-ssh".into(),
        layers: vec![ssh(), v2ray()],
    }
}

fn status(in_progress: bool, phase: Phase, pct: f64) -> SwitchStatus {
    SwitchStatus {
        in_progress,
        phase,
        progress_pct: pct,
        ..SwitchStatus::default()
    }
}

fn monitor(fake: &FakePanel, view: &RecordingView) -> SwitchMonitor<FakePanel, RecordingView> {
    SwitchMonitor::new(fake.clone(), view.clone(), INTERVAL)
}

async fn settle(monitor: &SwitchMonitor<FakePanel, RecordingView>) -> MonitorState {
    monitor
        .state()
        .wait_for(MonitorState::is_settled)
        .await
        .unwrap()
        .clone()
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn domain_layer_with_blank_fields_sends_nothing() {
    let fake = FakePanel::default();
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    let blank_domain = SwitchRequest::new("layer7-v2ray").with_domain("", "a@b.com");
    let err = monitor.initiate(blank_domain, &v2ray()).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    let blank_email = SwitchRequest::new("layer7-v2ray").with_domain("x.example.com", "  ");
    let err = monitor.initiate(blank_email, &v2ray()).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));

    assert_eq!(fake.start_calls(), 0);
    assert!(!monitor.is_polling());
    assert_eq!(view.count(&Event::Progress), 0);
    assert!(monitor.pending_request().is_none());
}

#[tokio::test(start_paused = true)]
async fn plain_layer_needs_no_domain() {
    let fake = FakePanel::default();
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();

    assert_eq!(fake.start_calls(), 1);
    assert!(monitor.is_polling());
    assert_eq!(
        monitor.pending_request().map(|r| r.layer_id),
        Some("layer4-ssh".to_owned())
    );
    monitor.stop();
}

// ── Initiation failures ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rejected_switch_stays_on_catalog() {
    let fake = FakePanel::default();
    fake.reject_with("A layer switch is already in progress");
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    let err = monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::Rejected { ref message } if message == "A layer switch is already in progress")
    );
    assert!(!monitor.is_polling());
    assert_eq!(view.count(&Event::Progress), 0);
    assert_eq!(
        view.events(),
        vec![Event::Error(
            "Rejected by panel: A layer switch is already in progress".into()
        )]
    );
    assert!(monitor.pending_request().is_none());
}

#[tokio::test(start_paused = true)]
async fn unreachable_panel_on_start_stays_on_catalog() {
    let fake = FakePanel::with_current(status(true, Phase::Installing, 20.0));
    fake.fail_starts();
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    let request = SwitchRequest::new("layer7-v2ray").with_domain("x.example.com", "a@b.com");
    let err = monitor.initiate(request, &v2ray()).await.unwrap_err();

    assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    assert_eq!(fake.start_calls(), 1);
    assert_eq!(view.events(), vec![Event::Error(unreachable().to_string())]);
    assert!(!monitor.is_polling());
    assert!(monitor.pending_request().is_none());
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Idle);

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(fake.status_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_initiate_while_polling_is_refused() {
    let fake = FakePanel::with_current(status(true, Phase::Installing, 20.0));
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();
    let err = monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::SwitchInProgress));
    assert_eq!(fake.start_calls(), 1);
    monitor.stop();
}

// ── Stop ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stop_twice_is_same_as_once() {
    let fake = FakePanel::with_current(status(true, Phase::Installing, 20.0));
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();
    tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(10)).await;
    let polled = fake.status_calls();
    assert_eq!(polled, 2);

    monitor.stop();
    let after_first = (monitor.state().borrow().clone(), monitor.is_polling());
    monitor.stop();
    let after_second = (monitor.state().borrow().clone(), monitor.is_polling());

    assert_eq!(after_first, (MonitorState::Idle, false));
    assert_eq!(after_first, after_second);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fake.status_calls(), polled);
}

#[tokio::test(start_paused = true)]
async fn dropping_monitor_stops_polling() {
    let fake = FakePanel::with_current(status(true, Phase::Installing, 20.0));
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();
    drop(monitor);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fake.status_calls(), 0);
}

/// Blocks the poll task inside `render` until the test releases it.
struct GatedView {
    entered: mpsc::SyncSender<()>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl SwitchView for GatedView {
    fn show_catalog(&self, _catalog: &LayerCatalog) {}

    fn show_progress(&self) {}

    fn render(&self, frame: &ProgressFrame) {
        if frame.phase == Phase::Starting {
            return;
        }
        let _ = self.entered.try_send(());
        let _ = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(5));
    }

    fn show_error(&self, _error: &CoreError) {}

    fn session_expired(&self) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_landing_after_stop_is_discarded() {
    let fake = FakePanel::with_current(status(false, Phase::Done, 100.0));
    let (entered_tx, entered_rx) = mpsc::sync_channel(1);
    let (release_tx, release_rx) = mpsc::channel();
    let view = GatedView {
        entered: entered_tx,
        release: Mutex::new(release_rx),
    };
    let monitor = SwitchMonitor::new(fake.clone(), view, Duration::from_millis(100));

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();

    // The poll task is now parked inside `render` on a worker thread.
    tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();

    monitor.stop();
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Idle);
    assert!(!monitor.is_polling());

    release_tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(monitor.state().borrow().clone(), MonitorState::Idle);
    assert!(monitor.last_status().is_none());
    assert!(!monitor.is_polling());
    assert_eq!(fake.status_calls(), 1);
}

// ── Resume ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn fresh_monitor_resumes_running_switch() {
    let fake = FakePanel::with_current(status(true, Phase::Installing, 40.0));
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    assert!(monitor.resume_if_active().await.unwrap());

    let events = view.events();
    assert_eq!(events[0], Event::Progress);
    let Event::Frame(frame) = &events[1] else {
        panic!("expected a rendered frame, got {events:?}");
    };
    assert_eq!(frame.percent, 40);
    assert_eq!(frame.phase_label, "Installing");
    assert_eq!(frame.indicator, Indicator::None);

    assert!(monitor.is_polling());
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Polling);

    tokio::time::sleep(INTERVAL + Duration::from_millis(10)).await;
    assert_eq!(fake.status_calls(), 2);
    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn resume_when_idle_leaves_catalog() {
    let fake = FakePanel::default();
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    assert!(!monitor.resume_if_active().await.unwrap());
    assert!(view.events().is_empty());
    assert!(!monitor.is_polling());
}

#[tokio::test(start_paused = true)]
async fn resume_shows_unacknowledged_terminal_record_without_polling() {
    let mut failed = status(false, Phase::Error, 35.0);
    failed.error = Some("certbot: too many requests".into());
    let fake = FakePanel::with_current(failed);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    assert!(monitor.resume_if_active().await.unwrap());
    assert!(!monitor.is_polling());
    assert_eq!(
        monitor.state().borrow().clone(),
        MonitorState::Finished {
            phase: Phase::Error,
            error: Some("certbot: too many requests".into()),
        }
    );
    let failure = monitor.state().borrow().failure();
    assert!(
        matches!(failure, Some(CoreError::SwitchFailed { ref message }) if message == "certbot: too many requests")
    );
    let frame = view.frames().pop().unwrap();
    assert_eq!(
        frame.indicator,
        Indicator::Failed("certbot: too many requests".into())
    );
    assert!(frame.back_visible);
}

// ── Poll failures ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn transport_failures_are_retried_until_done() {
    let fake = FakePanel::default();
    fake.script([
        Step::Unreachable,
        Step::Unreachable,
        Step::Unreachable,
        Step::Status(status(false, Phase::Done, 100.0)),
    ]);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();

    let state = settle(&monitor).await;
    assert_eq!(
        state,
        MonitorState::Finished {
            phase: Phase::Done,
            error: None
        }
    );
    assert_eq!(fake.status_calls(), 4);
    assert!(!monitor.is_polling());
    assert!(state.failure().is_none());

    let frame = view.frames().pop().unwrap();
    assert_eq!(frame.percent, 100);
    assert_eq!(frame.indicator, Indicator::Done);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fake.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn unreachable_poll_once_is_not_terminal() {
    let fake = FakePanel::default();
    fake.script([Step::Unreachable]);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    assert_eq!(monitor.poll_once().await, PollOutcome::Unreachable);
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Idle);
    assert!(view.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn session_expiry_stops_polling() {
    let fake = FakePanel::default();
    fake.script([
        Step::Status(status(true, Phase::Uninstalling, 10.0)),
        Step::Expired,
    ]);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();

    assert_eq!(settle(&monitor).await, MonitorState::SessionExpired);
    assert!(!monitor.is_polling());
    assert_eq!(view.count(&Event::SessionExpired), 1);

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fake.status_calls(), 2);
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn switch_to_v2ray_end_to_end() {
    let fake = FakePanel::default();
    fake.script([
        Step::Status(SwitchStatus {
            log_lines: vec!["Stopping dropbear".into()],
            ..status(true, Phase::Uninstalling, 10.0)
        }),
        Step::Unreachable,
        Step::Status(SwitchStatus {
            log_lines: vec!["Stopping dropbear".into(), "Reinstalling panel".into()],
            ..status(true, Phase::ReinstallingPanel, 70.0)
        }),
        Step::Status(status(false, Phase::Done, 100.0)),
    ]);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    let request = SwitchRequest::new("layer7-v2ray").with_domain("x.example.com", "a@b.com");
    monitor.initiate(request, &v2ray()).await.unwrap();

    assert_eq!(
        view.events(),
        vec![Event::Progress, Event::Frame(ProgressFrame::initial())]
    );
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Polling);

    settle(&monitor).await;

    let frames = view.frames();
    let summary: Vec<_> = frames
        .iter()
        .map(|f| (f.percent, f.phase_label, f.back_visible))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "Starting", false),
            (10, "Uninstalling", false),
            (70, "Reinstalling panel", false),
            (100, "Done", true),
        ]
    );
    assert!(frames[0].log.is_empty());
    assert_eq!(frames[2].log.len(), 2);
    assert_eq!(frames[3].indicator, Indicator::Done);
    assert!(!monitor.is_polling());
    assert_eq!(fake.status_calls(), 4);
}

// ── Reset ───────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn reset_after_done_clears_and_is_not_resumed() {
    let fake = FakePanel::default();
    fake.script([Step::Status(status(false, Phase::Done, 100.0))]);
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    monitor
        .initiate(SwitchRequest::new("layer4-ssh"), &ssh())
        .await
        .unwrap();
    settle(&monitor).await;

    let catalog = monitor.reset().await.unwrap();
    assert_eq!(catalog.current, "layer4-ssh");
    assert_eq!(fake.clear_calls(), 1);
    assert_eq!(view.events().last(), Some(&Event::Catalog));
    assert_eq!(monitor.state().borrow().clone(), MonitorState::Idle);
    assert!(monitor.pending_request().is_none());

    let progress_views = view.count(&Event::Progress);
    assert!(!monitor.resume_if_active().await.unwrap());
    assert_eq!(view.count(&Event::Progress), progress_views);
}

#[tokio::test(start_paused = true)]
async fn failed_clear_is_retried_then_hidden_for_this_monitor() {
    let done = status(false, Phase::Done, 100.0);
    let fake = FakePanel::with_current(done);
    fake.fail_clears();
    let view = RecordingView::default();
    let monitor = monitor(&fake, &view);

    assert!(monitor.resume_if_active().await.unwrap());
    monitor.reset().await.unwrap();
    assert_eq!(fake.clear_calls(), 2);

    assert!(!monitor.resume_if_active().await.unwrap());

    // The record is still on the panel, so a new view shows it again.
    let other_view = RecordingView::default();
    let fresh = SwitchMonitor::new(fake.clone(), other_view.clone(), INTERVAL);
    assert!(fresh.resume_if_active().await.unwrap());
    assert_eq!(other_view.count(&Event::Progress), 1);
}
