use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use hushtype_core::{format_time, LevelMeter, RecordingError, SessionState};
use hushtype_gateway::backend::commands;
use hushtype_gateway::{Backend, BackendEvent, CommandGate};

use crate::clock::Clock;
use crate::countdown::Countdown;

/// Coarse countdown tick; 1 Hz is enough for an MM:SS display.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Animation frame period for the level meter (~30 fps).
pub const FRAME_PERIOD: Duration = Duration::from_millis(33);

/// How long an optimistic transition may wait for the backend to re-assert
/// truth before the controller rolls it back. Without this, a retry whose
/// command was accepted but never followed by a terminal event would leave
/// the popup on "Transcribing" forever.
pub const RECONCILE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
struct Reconcile {
    deadline_ms: u64,
    rollback: RecordingError,
}

struct Inner {
    state: SessionState,
    countdown: Countdown,
    meter: LevelMeter,

    // Set when a command mutated state ahead of backend confirmation
    // (retry); cleared by the next terminal event or by rollback.
    reconcile: Option<Reconcile>,

    shut_down: bool,
}

/// Snapshot of everything the popup renders. The `can_*` flags fold in both
/// state validity and command-in-flight gating, so a control stays disabled
/// while its command is outstanding.
#[derive(Debug, Clone, Serialize)]
pub struct PopupStatus {
    pub state: SessionState,
    pub stage_label: &'static str,
    pub remaining_ms: u64,
    pub timer_label: String,
    pub level: f32,
    pub can_cancel: bool,
    pub can_stop: bool,
    pub can_retry: bool,
    pub can_dismiss: bool,
}

/// Single source of truth for the recording popup. Derives its state from
/// backend-pushed events, drives the countdown and the level meter, and
/// forwards user intent (cancel/stop/retry/dismiss) back to the backend.
///
/// Commands are fire-and-forget: a failure is logged and local state is left
/// for the backend to re-assert via a subsequent event. Only `retry` and
/// `dismiss` mutate state optimistically, and `retry` carries a
/// reconciliation deadline (see [`RECONCILE_TIMEOUT_MS`]).
#[derive(Clone)]
pub struct PopupController {
    inner: Arc<Mutex<Inner>>,
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    gate: CommandGate,
}

impl PopupController {
    pub fn new(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::idle_armed(),
                countdown: Countdown::default(),
                meter: LevelMeter::new(),
                reconcile: None,
                shut_down: false,
            })),
            backend,
            clock,
            gate: CommandGate::new(),
        }
    }

    fn set_state(inner: &mut Inner, next: SessionState) {
        if inner.state != next {
            info!("session state: {} -> {}", inner.state.label(), next.label());
        }
        inner.state = next;
    }

    /// Apply one backend event. Idempotent under duplicate delivery of
    /// terminal events: each handler only writes the state the event mandates.
    pub async fn handle_event(&self, event: BackendEvent) {
        let resize_for_error = {
            let mut inner = self.inner.lock().await;
            if inner.shut_down {
                return;
            }

            if event.is_terminal() {
                inner.reconcile = None;
            }

            match event {
                BackendEvent::RecordingStarted => {
                    let now = self.clock.now_ms();
                    // Arming replaces any previous countdown, so a duplicate
                    // recording-started cannot leave two timers running.
                    inner.countdown.arm(now);
                    inner.meter.reset();
                    Self::set_state(
                        &mut inner,
                        SessionState::Recording {
                            started_at_ms: Some(now),
                        },
                    );
                    false
                }
                BackendEvent::RecordingTranscribing => {
                    inner.countdown.disarm();
                    Self::set_state(&mut inner, SessionState::Transcribing);
                    false
                }
                BackendEvent::RecordingStopped | BackendEvent::RecordingCancelled => {
                    inner.countdown.disarm();
                    Self::set_state(&mut inner, SessionState::idle_armed());
                    false
                }
                BackendEvent::RecordingError(err) => {
                    warn!(
                        kind = ?err.kind,
                        message = %err.message,
                        "backend reported recording error"
                    );
                    inner.countdown.disarm();
                    Self::set_state(&mut inner, SessionState::Error(err));
                    true
                }
                BackendEvent::RecordingStateChanged { state } => {
                    // Onboarding trial feedback; not a popup concern.
                    trace!(state = %state, "ignoring recording-state-changed");
                    false
                }
            }
        };

        if resize_for_error {
            // The error view needs a wider popup; best-effort.
            if let Err(e) = self.backend.resize_popup_for_error().await {
                warn!(error = %e, "popup resize for error failed");
            }
        }
    }

    /// Record the latest raw audio level. Never touches session state.
    pub async fn push_level(&self, raw: f32) {
        let mut inner = self.inner.lock().await;
        if inner.shut_down {
            return;
        }
        inner.meter.push_raw(raw);
    }

    /// Animation-frame tick: advance the smoothed level one step.
    pub async fn frame(&self) -> f32 {
        let mut inner = self.inner.lock().await;
        if inner.shut_down {
            return inner.meter.smoothed();
        }
        inner.meter.tick()
    }

    /// Coarse (~1 Hz) tick: countdown expiry and reconciliation timeout.
    pub async fn tick(&self) {
        enum Action {
            None,
            AutoStop,
        }

        let action = {
            let mut inner = self.inner.lock().await;
            if inner.shut_down {
                return;
            }
            let now = self.clock.now_ms();

            // Optimistic state that was never confirmed: roll back.
            if let Some(rec) = inner.reconcile.clone() {
                if now >= rec.deadline_ms {
                    warn!(
                        "no terminal event within {}ms of retry; rolling back to error view",
                        RECONCILE_TIMEOUT_MS
                    );
                    inner.reconcile = None;
                    inner.countdown.disarm();
                    Self::set_state(&mut inner, SessionState::Error(rec.rollback));
                }
            }

            if inner.state.is_recording_active() && inner.countdown.expire_once(now) {
                info!("max recording duration reached; auto-stopping");
                Action::AutoStop
            } else {
                Action::None
            }
        };

        if let Action::AutoStop = action {
            self.stop().await;
        }
    }

    /// Abort the current capture. Valid while actively recording.
    pub async fn cancel(&self) {
        if !self.recording_active().await {
            debug!("cancel ignored outside active recording");
            return;
        }
        let Some(_guard) = self.gate.try_acquire(commands::CANCEL_RECORDING) else {
            debug!("cancel already in flight");
            return;
        };
        if let Err(e) = self.backend.cancel_recording().await {
            warn!(error = %e, "cancel command failed; awaiting backend event");
        }
    }

    /// Finalize the capture and begin transcription. Valid while actively
    /// recording; also invoked exactly once by countdown expiry.
    pub async fn stop(&self) {
        if !self.recording_active().await {
            debug!("stop ignored outside active recording");
            return;
        }
        let Some(_guard) = self.gate.try_acquire(commands::STOP_RECORDING) else {
            debug!("stop already in flight");
            return;
        };
        if let Err(e) = self.backend.stop_recording().await {
            warn!(error = %e, "stop command failed; awaiting backend event");
        }
    }

    /// Re-attempt transcription of the captured audio. Valid only in an
    /// error state whose `can_retry` is set; otherwise a no-op.
    ///
    /// Validation and the optimistic write happen under one lock
    /// acquisition: an event handler on another task cannot commit a state
    /// change in between, so the tentative Transcribing can never stomp a
    /// fresher session.
    pub async fn retry(&self) {
        let _guard = {
            let mut inner = self.inner.lock().await;
            if inner.shut_down {
                return;
            }
            let rollback = match &inner.state {
                SessionState::Error(err) if err.can_retry => err.clone(),
                SessionState::Error(_) => {
                    debug!("retry not offered for this error");
                    return;
                }
                _ => {
                    debug!("retry ignored outside error state");
                    return;
                }
            };

            let Some(guard) = self.gate.try_acquire(commands::RETRY_TRANSCRIPTION) else {
                debug!("retry already in flight");
                return;
            };

            // Two-phase update: tentative Transcribing now, reconciled by the
            // next terminal event or rolled back at the deadline.
            inner.reconcile = Some(Reconcile {
                deadline_ms: self.clock.now_ms() + RECONCILE_TIMEOUT_MS,
                rollback,
            });
            Self::set_state(&mut inner, SessionState::Transcribing);
            guard
        };

        if let Err(e) = self.backend.retry_transcription().await {
            warn!(error = %e, "retry command failed; reconciliation deadline armed");
        }
    }

    /// Discard the error and its temp audio file. Valid in any error state.
    /// Check and write share one lock acquisition, as in [`Self::retry`].
    pub async fn dismiss(&self) {
        let _guard = {
            let mut inner = self.inner.lock().await;
            if inner.shut_down || !inner.state.is_error() {
                debug!("dismiss ignored outside error state");
                return;
            }
            let Some(guard) = self.gate.try_acquire(commands::DISMISS_ERROR) else {
                debug!("dismiss already in flight");
                return;
            };

            inner.countdown.disarm();
            inner.reconcile = None;
            inner.meter.reset();
            Self::set_state(&mut inner, SessionState::idle_armed());
            guard
        };

        if let Err(e) = self.backend.dismiss_error().await {
            warn!(error = %e, "dismiss command failed");
        }
    }

    pub async fn status(&self) -> PopupStatus {
        let inner = self.inner.lock().await;
        let now = self.clock.now_ms();
        let remaining_ms = if inner.state.is_recording_active() {
            inner.countdown.remaining_ms(now)
        } else {
            0
        };

        let can_retry = matches!(&inner.state, SessionState::Error(e) if e.can_retry)
            && !self.gate.is_inflight(commands::RETRY_TRANSCRIPTION);

        PopupStatus {
            stage_label: inner.state.label(),
            remaining_ms,
            timer_label: format_time(remaining_ms),
            level: inner.meter.smoothed(),
            can_cancel: inner.state.is_recording_active()
                && !self.gate.is_inflight(commands::CANCEL_RECORDING),
            can_stop: inner.state.is_recording_active()
                && !self.gate.is_inflight(commands::STOP_RECORDING),
            can_retry,
            can_dismiss: inner.state.is_error()
                && !self.gate.is_inflight(commands::DISMISS_ERROR),
            state: inner.state.clone(),
        }
    }

    /// Tear down all periodic activity. After this the controller ignores
    /// events, levels, ticks and commands; `run` exits on its next iteration.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        inner.shut_down = true;
        inner.countdown.disarm();
        inner.reconcile = None;
        info!("popup controller shut down");
    }

    pub async fn is_shut_down(&self) -> bool {
        self.inner.lock().await.shut_down
    }

    async fn recording_active(&self) -> bool {
        let inner = self.inner.lock().await;
        !inner.shut_down && inner.state.is_recording_active()
    }

    /// Event pump for a live popup window: subscribes to the backend and
    /// interleaves events, level pushes, the 1 Hz countdown tick and the
    /// frame tick until `shutdown`. Subscriptions are released when the loop
    /// exits (receiver drop unsubscribes).
    pub async fn run(&self) {
        let mut events = self.backend.subscribe_events();
        let mut levels = self.backend.register_audio_level_channel();
        let mut tick = tokio::time::interval(TICK_PERIOD);
        let mut frame = tokio::time::interval(FRAME_PERIOD);

        loop {
            if self.is_shut_down().await {
                break;
            }

            tokio::select! {
                ev = events.recv() => match ev {
                    Ok(ev) => self.handle_event(ev).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event subscription lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = levels.changed() => match changed {
                    Ok(()) => {
                        let raw = *levels.borrow_and_update();
                        self.push_level(raw).await;
                    }
                    Err(_) => break,
                },
                _ = tick.tick() => self.tick().await,
                _ = frame.tick() => {
                    self.frame().await;
                }
            }
        }
    }
}
