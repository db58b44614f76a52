// ── Switch monitor ──
//
// Drives the layer-switch flow: initiate, poll, render, detect the terminal
// phase, acknowledge. Owns at most one background poll task at a time; the
// task is cancelled on `stop`, on a terminal snapshot, on 401, and when the
// monitor is dropped.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use panel_api::{LayerCatalog, LayerDescriptor, Phase, SwitchRequest, SwitchStatus};

use super::backend::SwitchBackend;
use super::request::validate_request;
use super::view::{ProgressFrame, SwitchView};
use crate::error::CoreError;

/// How often `reset` tries to clear the server's terminal record.
const CLEAR_ATTEMPTS: u32 = 2;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ── Observable state ─────────────────────────────────────────────────

/// Lifecycle of the monitor, observable through [`SwitchMonitor::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Polling,
    /// The last snapshot was terminal. `error` is the server's message for
    /// a failed switch.
    Finished { phase: Phase, error: Option<String> },
    SessionExpired,
}

impl MonitorState {
    /// Polling will not continue without user action.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::SessionExpired)
    }

    /// The error a settled state stands for. `None` for a completed switch
    /// and for states that are not settled.
    pub fn failure(&self) -> Option<CoreError> {
        match self {
            Self::Idle | Self::Polling | Self::Finished { phase: Phase::Done, .. } => None,
            Self::Finished { error, .. } => Some(CoreError::SwitchFailed {
                message: error
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "no details from the panel".into()),
            }),
            Self::SessionExpired => Some(CoreError::SessionExpired),
        }
    }
}

/// Result of a single status fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Rendered; the switch is still running.
    Progress(SwitchStatus),
    /// Rendered a terminal snapshot; polling stopped.
    Finished(SwitchStatus),
    /// The fetch failed. Not terminal; the next tick retries.
    Unreachable,
    SessionExpired,
    /// The loop was stopped while the fetch was in flight. Nothing was
    /// recorded.
    Discarded,
}

// ── Internals ────────────────────────────────────────────────────────

struct PollTask {
    generation: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollTask {
    fn shutdown(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

#[derive(Default)]
struct Slot {
    task: Option<PollTask>,
    generation: u64,
    pending: Option<SwitchRequest>,
    last: Option<SwitchStatus>,
    /// Terminal snapshot the user already dismissed via `reset`.
    acknowledged: Option<SwitchStatus>,
}

impl Slot {
    /// `None` stands for a caller outside any poll loop and always owns.
    fn is_owned_by(&self, owner: Option<u64>) -> bool {
        owner.is_none_or(|generation| {
            self.task.as_ref().is_some_and(|t| t.generation == generation)
        })
    }

    fn end_polling(&mut self, owner: Option<u64>) {
        match owner {
            // The loop is finishing on its own; detach rather than abort it.
            Some(_) => self.task = None,
            None => {
                if let Some(task) = self.task.take() {
                    task.shutdown();
                }
            }
        }
    }
}

struct Shared<B, V> {
    backend: B,
    view: V,
    interval: Duration,
    slot: Mutex<Slot>,
    state: watch::Sender<MonitorState>,
}

impl<B: SwitchBackend, V: SwitchView> Shared<B, V> {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().expect("switch monitor lock poisoned")
    }

    /// Render a fetch result. Terminal snapshots and 401 end polling.
    ///
    /// `owner` is the generation of the poll loop calling this, or `None`
    /// for a caller outside any loop. A loop that no longer owns the slot
    /// has been stopped; its result is discarded.
    fn apply(&self, fetched: Result<SwitchStatus, CoreError>, owner: Option<u64>) -> PollOutcome {
        if !self.slot().is_owned_by(owner) {
            debug!(?owner, "discarding status from a stopped poll loop");
            return PollOutcome::Discarded;
        }

        match fetched {
            Ok(status) => {
                self.view.render(&ProgressFrame::from_status(&status));

                // `stop` may have run on another thread while rendering.
                let mut slot = self.slot();
                if !slot.is_owned_by(owner) {
                    debug!(?owner, "poll loop stopped while rendering");
                    return PollOutcome::Discarded;
                }
                slot.last = Some(status.clone());

                if !status.is_finished() {
                    return PollOutcome::Progress(status);
                }

                info!(phase = %status.phase, "layer switch finished");
                slot.end_polling(owner);
                self.state.send_replace(MonitorState::Finished {
                    phase: status.phase,
                    error: status.error.clone(),
                });
                PollOutcome::Finished(status)
            }
            Err(e) if e.is_session_expired() => {
                {
                    let mut slot = self.slot();
                    if !slot.is_owned_by(owner) {
                        return PollOutcome::Discarded;
                    }
                    slot.end_polling(owner);
                    self.state.send_replace(MonitorState::SessionExpired);
                }
                warn!("panel session expired");
                self.view.session_expired();
                PollOutcome::SessionExpired
            }
            Err(e) => {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "switch status poll failed, retrying on next tick"
                );
                PollOutcome::Unreachable
            }
        }
    }

    fn expire(&self) {
        warn!("panel session expired");
        self.state.send_replace(MonitorState::SessionExpired);
        self.view.session_expired();
    }

    fn report(&self, err: &CoreError) {
        if err.is_session_expired() {
            self.expire();
        } else {
            self.view.show_error(err);
        }
    }
}

// ── SwitchMonitor ────────────────────────────────────────────────────

/// State machine for one layer-switch view.
///
/// Create one when the switch view is shown and drop it when the view is
/// left; dropping stops polling. Requires a tokio runtime: polling runs as
/// a spawned task.
pub struct SwitchMonitor<B: SwitchBackend, V: SwitchView> {
    shared: Arc<Shared<B, V>>,
}

impl<B: SwitchBackend, V: SwitchView> SwitchMonitor<B, V> {
    pub fn new(backend: B, view: V, poll_interval: Duration) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        Self {
            shared: Arc::new(Shared {
                backend,
                view,
                interval: poll_interval.max(MIN_POLL_INTERVAL),
                slot: Mutex::new(Slot::default()),
                state,
            }),
        }
    }

    pub fn view(&self) -> &V {
        &self.shared.view
    }

    /// Subscribe to lifecycle changes.
    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.shared.state.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.shared.slot().task.is_some()
    }

    /// The request most recently sent to the panel, until `reset`.
    pub fn pending_request(&self) -> Option<SwitchRequest> {
        self.shared.slot().pending.clone()
    }

    /// The last snapshot rendered.
    pub fn last_status(&self) -> Option<SwitchStatus> {
        self.shared.slot().last.clone()
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the layer catalog and show it.
    pub async fn show_catalog(&self) -> Result<LayerCatalog, CoreError> {
        match self.shared.backend.list_layers().await {
            Ok(catalog) => {
                self.shared.view.show_catalog(&catalog);
                Ok(catalog)
            }
            Err(e) => {
                self.shared.report(&e);
                Err(e)
            }
        }
    }

    /// Validate and send a switch request, then start polling.
    ///
    /// Nothing is sent when validation fails. A refusal or transport error
    /// is shown inline and leaves the catalog in place.
    pub async fn initiate(
        &self,
        request: SwitchRequest,
        layer: &LayerDescriptor,
    ) -> Result<(), CoreError> {
        if self.is_polling() {
            let err = CoreError::SwitchInProgress;
            self.shared.view.show_error(&err);
            return Err(err);
        }

        let request = match validate_request(&request, layer) {
            Ok(request) => request,
            Err(e) => {
                self.shared.view.show_error(&e);
                return Err(e);
            }
        };

        self.shared.slot().pending = Some(request.clone());
        info!(layer = %request.layer_id, "initiating layer switch");

        let result = match self.shared.backend.start_switch(&request).await {
            Ok(ack) if ack.success => Ok(()),
            Ok(ack) => Err(CoreError::Rejected {
                message: ack
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "layer switch refused".into()),
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.shared.slot().pending = None;
            self.shared.report(&e);
            return Err(e);
        }

        {
            let mut slot = self.shared.slot();
            slot.last = None;
            slot.acknowledged = None;
        }
        self.shared.view.show_progress();
        self.shared.view.render(&ProgressFrame::initial());
        self.start_polling();
        Ok(())
    }

    /// Fetch and render one snapshot outside the poll loop.
    pub async fn poll_once(&self) -> PollOutcome {
        let fetched = self.shared.backend.switch_status().await;
        self.shared.apply(fetched, None)
    }

    /// Attach to a switch that is already running or left a terminal record.
    ///
    /// Returns `true` if the progress view was entered. A terminal record
    /// this monitor already acknowledged is ignored.
    pub async fn resume_if_active(&self) -> Result<bool, CoreError> {
        let status = match self.shared.backend.switch_status().await {
            Ok(status) => status,
            Err(e) => {
                if e.is_session_expired() {
                    self.shared.expire();
                }
                return Err(e);
            }
        };

        if !status.is_active() {
            debug!("no layer switch active");
            return Ok(false);
        }

        let acknowledged = self.shared.slot().acknowledged.as_ref() == Some(&status);
        if status.is_finished() && acknowledged {
            debug!("terminal switch record already acknowledged");
            return Ok(false);
        }

        info!(phase = %status.phase, "attaching to layer switch");
        let in_progress = status.in_progress;
        self.shared.view.show_progress();
        self.shared.apply(Ok(status), None);
        if in_progress {
            self.start_polling();
        }
        Ok(true)
    }

    /// Dismiss a finished switch and go back to the catalog.
    ///
    /// Clearing the server's record is best effort: after the retries fail,
    /// the snapshot is remembered so this monitor does not show it again.
    pub async fn reset(&self) -> Result<LayerCatalog, CoreError> {
        self.stop();

        let mut cleared = false;
        for attempt in 1..=CLEAR_ATTEMPTS {
            match self.shared.backend.clear_switch().await {
                Ok(()) => {
                    cleared = true;
                    break;
                }
                Err(e) if e.is_session_expired() => {
                    self.shared.expire();
                    return Err(e);
                }
                Err(e) => warn!(attempt, error = %e, "clearing switch record failed"),
            }
        }

        {
            let mut slot = self.shared.slot();
            slot.pending = None;
            if let Some(last) = slot.last.take().filter(SwitchStatus::is_finished) {
                slot.acknowledged = Some(last);
            }
        }
        if !cleared {
            warn!("switch record left on the panel; hidden for this session only");
        }

        self.shared.state.send_replace(MonitorState::Idle);
        self.show_catalog().await
    }

    /// Cancel polling. Idempotent.
    pub fn stop(&self) {
        let task = self.shared.slot().task.take();
        if let Some(task) = task {
            task.shutdown();
            debug!("switch polling stopped");
            self.shared.state.send_if_modified(|state| {
                if *state == MonitorState::Polling {
                    *state = MonitorState::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }

    /// Start a poll loop, replacing any running one.
    fn start_polling(&self) {
        let cancel = CancellationToken::new();
        let mut slot = self.shared.slot();
        if let Some(old) = slot.task.take() {
            old.shutdown();
        }
        slot.generation += 1;
        let generation = slot.generation;

        // Published under the lock so a fast-finishing loop cannot be
        // overwritten by this update.
        self.shared.state.send_replace(MonitorState::Polling);

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.shared),
            cancel.clone(),
            generation,
        ));
        slot.task = Some(PollTask {
            generation,
            cancel,
            handle,
        });
        debug!(generation, interval = ?self.shared.interval, "switch polling started");
    }
}

impl<B: SwitchBackend, V: SwitchView> Drop for SwitchMonitor<B, V> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Background task ──────────────────────────────────────────────────

/// Poll switch status every interval until cancelled or settled.
///
/// One fetch at a time; a fetch still in flight when the token fires is
/// dropped without rendering.
async fn poll_loop<B: SwitchBackend, V: SwitchView>(
    shared: Arc<Shared<B, V>>,
    cancel: CancellationToken,
    generation: u64,
) {
    let mut interval = tokio::time::interval(shared.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            fetched = shared.backend.switch_status() => fetched,
        };

        match shared.apply(fetched, Some(generation)) {
            PollOutcome::Finished(_) | PollOutcome::SessionExpired | PollOutcome::Discarded => {
                break;
            }
            PollOutcome::Progress(_) | PollOutcome::Unreachable => {}
        }
    }

    debug!(generation, "switch poll loop exited");
}
