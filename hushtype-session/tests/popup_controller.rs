use std::sync::Arc;

use hushtype_core::{RecordingError, SessionState, MAX_RECORDING_DURATION_MS};
use hushtype_gateway::backend::commands;
use hushtype_gateway::{Backend, BackendEvent, FakeBackend};
use hushtype_session::clock::Clock;
use hushtype_session::controller::RECONCILE_TIMEOUT_MS;
use hushtype_session::{ManualClock, PopupController};

fn setup() -> (Arc<FakeBackend>, Arc<ManualClock>, PopupController) {
    let backend = Arc::new(FakeBackend::new());
    let clock = Arc::new(ManualClock::new());
    let controller = PopupController::new(
        backend.clone() as Arc<dyn Backend>,
        clock.clone() as Arc<dyn Clock>,
    );
    (backend, clock, controller)
}

fn transcription_error(can_retry: bool) -> RecordingError {
    RecordingError::transcription(
        "provider returned 503",
        "Transcription failed. Check your connection.",
        can_retry,
        Some("/tmp/rec-42.wav".into()),
    )
}

#[tokio::test]
async fn state_follows_the_last_terminal_event_despite_level_pushes() {
    let (_backend, _clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    for i in 0..50 {
        controller.push_level(i as f32 / 50.0).await;
        controller.frame().await;
    }
    assert!(controller.status().await.state.is_recording_active());

    controller
        .handle_event(BackendEvent::RecordingTranscribing)
        .await;
    for _ in 0..50 {
        controller.push_level(0.7).await;
        controller.frame().await;
    }
    assert_eq!(controller.status().await.state, SessionState::Transcribing);

    controller.handle_event(BackendEvent::RecordingStopped).await;
    controller.push_level(1.0).await;
    assert_eq!(controller.status().await.state, SessionState::idle_armed());
}

#[tokio::test]
async fn duplicate_terminal_events_are_idempotent() {
    let (_backend, _clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStopped).await;
    controller.handle_event(BackendEvent::RecordingStopped).await;
    assert_eq!(controller.status().await.state, SessionState::idle_armed());

    controller
        .handle_event(BackendEvent::RecordingTranscribing)
        .await;
    controller
        .handle_event(BackendEvent::RecordingTranscribing)
        .await;
    assert_eq!(controller.status().await.state, SessionState::Transcribing);
}

#[tokio::test]
async fn countdown_auto_stops_exactly_once_at_max_duration() {
    let (backend, clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;

    // Tick up to just before expiry: no stop.
    clock.set(MAX_RECORDING_DURATION_MS - 1_000);
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);
    assert_eq!(controller.status().await.remaining_ms, 1_000);

    clock.set(MAX_RECORDING_DURATION_MS);
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 1);

    // Zero was crossed; further ticks must not fire again.
    for _ in 0..5 {
        clock.advance(1_000);
        controller.tick().await;
    }
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 1);
}

#[tokio::test]
async fn double_recording_started_leaves_a_single_countdown() {
    let (backend, clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    clock.advance(120_000);
    // Backend restarted the session without a stop in between.
    controller.handle_event(BackendEvent::RecordingStarted).await;

    // The first session's expiry point: the countdown was re-armed, so
    // nothing fires here.
    clock.set(MAX_RECORDING_DURATION_MS);
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);

    // Only the re-armed countdown fires, once.
    clock.set(120_000 + MAX_RECORDING_DURATION_MS);
    controller.tick().await;
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 1);
}

#[tokio::test]
async fn timer_label_renders_remaining_time() {
    let (_backend, clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    assert_eq!(controller.status().await.timer_label, "10:00");

    clock.advance(MAX_RECORDING_DURATION_MS - 65_000);
    assert_eq!(controller.status().await.timer_label, "01:05");
}

#[tokio::test]
async fn error_event_replaces_state_and_requests_popup_resize() {
    let (backend, _clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;

    let status = controller.status().await;
    assert!(status.state.is_error());
    assert_eq!(status.remaining_ms, 0);
    assert!(status.can_retry);
    assert!(status.can_dismiss);
    assert!(!status.can_stop);
    assert_eq!(backend.call_count(commands::RESIZE_POPUP_FOR_ERROR), 1);

    // The countdown died with the session: its old expiry point is inert.
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);
}

#[tokio::test]
async fn dismiss_clears_the_error_into_the_idle_armed_view() {
    let (backend, _clock, controller) = setup();

    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;
    controller.dismiss().await;

    let status = controller.status().await;
    assert_eq!(status.state, SessionState::idle_armed());
    assert!(!status.can_retry);
    assert!(!status.can_dismiss);
    assert_eq!(backend.call_count(commands::DISMISS_ERROR), 1);

    // Dismiss outside an error state is a no-op.
    controller.dismiss().await;
    assert_eq!(backend.call_count(commands::DISMISS_ERROR), 1);
}

#[tokio::test]
async fn retry_is_a_no_op_when_the_error_is_not_retryable() {
    let (backend, _clock, controller) = setup();

    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(false)))
        .await;

    assert!(!controller.status().await.can_retry);
    controller.retry().await;

    assert_eq!(backend.call_count(commands::RETRY_TRANSCRIPTION), 0);
    assert!(controller.status().await.state.is_error());
}

#[tokio::test]
async fn retry_optimistically_shows_transcribing_then_reconciles() {
    let (backend, _clock, controller) = setup();

    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;
    controller.retry().await;

    // Tentative state, ahead of backend confirmation.
    assert_eq!(controller.status().await.state, SessionState::Transcribing);
    assert_eq!(backend.call_count(commands::RETRY_TRANSCRIPTION), 1);

    // Backend confirms with a terminal event; the tentative state stands.
    controller.handle_event(BackendEvent::RecordingStopped).await;
    assert_eq!(controller.status().await.state, SessionState::idle_armed());
}

#[tokio::test]
async fn unconfirmed_retry_rolls_back_at_the_reconcile_deadline() {
    let (_backend, clock, controller) = setup();

    let err = transcription_error(true);
    controller
        .handle_event(BackendEvent::RecordingError(err.clone()))
        .await;
    controller.retry().await;
    assert_eq!(controller.status().await.state, SessionState::Transcribing);

    // No terminal event arrives. Before the deadline nothing changes...
    clock.advance(RECONCILE_TIMEOUT_MS - 1);
    controller.tick().await;
    assert_eq!(controller.status().await.state, SessionState::Transcribing);

    // ...at the deadline the saved error view is restored.
    clock.advance(1);
    controller.tick().await;
    assert_eq!(controller.status().await.state, SessionState::Error(err));
}

#[tokio::test]
async fn command_failure_is_swallowed_and_leaves_state_unchanged() {
    let (backend, _clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    backend.fail_next(commands::CANCEL_RECORDING);
    controller.cancel().await;

    // Still recording: the UI waits for the backend's authoritative event.
    assert!(controller.status().await.state.is_recording_active());
    assert_eq!(backend.call_count(commands::CANCEL_RECORDING), 1);

    controller
        .handle_event(BackendEvent::RecordingCancelled)
        .await;
    assert_eq!(controller.status().await.state, SessionState::idle_armed());
}

#[tokio::test]
async fn commands_outside_their_valid_state_are_ignored() {
    let (backend, _clock, controller) = setup();

    // Idle-armed: no active capture to stop or cancel.
    controller.stop().await;
    controller.cancel().await;
    controller.retry().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);
    assert_eq!(backend.call_count(commands::CANCEL_RECORDING), 0);
    assert_eq!(backend.call_count(commands::RETRY_TRANSCRIPTION), 0);

    controller
        .handle_event(BackendEvent::RecordingTranscribing)
        .await;
    controller.stop().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);
}

#[tokio::test]
async fn shutdown_mid_recording_stops_all_activity() {
    let (backend, clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    controller.push_level(0.8).await;
    controller.frame().await;
    let level_at_shutdown = controller.status().await.level;

    controller.shutdown().await;

    // The countdown is gone: its expiry point never auto-stops.
    clock.set(MAX_RECORDING_DURATION_MS);
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 0);

    // Events, levels and frames no longer move anything.
    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;
    controller.push_level(0.1).await;
    controller.frame().await;

    let status = controller.status().await;
    assert!(status.state.is_recording(), "state frozen at shutdown");
    assert_eq!(status.level, level_at_shutdown);
    assert_eq!(backend.call_count(commands::RESIZE_POPUP_FOR_ERROR), 0);
}

#[tokio::test]
async fn dismiss_racing_a_new_recording_never_stomps_the_session() {
    // A dismiss on one task and a recording-started on another may land in
    // either order; validation and the optimistic write share one lock
    // acquisition, so whichever order wins, the fresh session (and its
    // countdown) must survive.
    let (backend, clock, controller) = setup();

    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;

    let dismissing = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.dismiss().await })
    };
    let starting = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller.handle_event(BackendEvent::RecordingStarted).await
        })
    };
    dismissing.await.unwrap();
    starting.await.unwrap();

    assert!(controller.status().await.state.is_recording_active());

    // The new session's countdown is live: it auto-stops exactly once.
    clock.set(MAX_RECORDING_DURATION_MS);
    controller.tick().await;
    controller.tick().await;
    assert_eq!(backend.call_count(commands::STOP_RECORDING), 1);
}

#[tokio::test]
async fn retry_racing_a_terminal_event_never_resurrects_transcribing() {
    // Same shape for retry: if a terminal event commits first, the retry's
    // validation fails under the same lock and no tentative Transcribing
    // (nor a reconciliation deadline) is left behind.
    let (_backend, clock, controller) = setup();

    controller
        .handle_event(BackendEvent::RecordingError(transcription_error(true)))
        .await;

    let retrying = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.retry().await })
    };
    let stopping = {
        let controller = controller.clone();
        tokio::spawn(async move {
            controller.handle_event(BackendEvent::RecordingStopped).await
        })
    };
    retrying.await.unwrap();
    stopping.await.unwrap();

    assert_eq!(controller.status().await.state, SessionState::idle_armed());

    // No stale reconciliation deadline fires later either.
    clock.advance(RECONCILE_TIMEOUT_MS + 1_000);
    controller.tick().await;
    assert_eq!(controller.status().await.state, SessionState::idle_armed());
}

#[tokio::test]
async fn recording_state_changed_is_not_a_popup_concern() {
    let (_backend, _clock, controller) = setup();

    controller.handle_event(BackendEvent::RecordingStarted).await;
    controller
        .handle_event(BackendEvent::RecordingStateChanged {
            state: "recording".into(),
        })
        .await;

    // Still the same session, countdown intact.
    assert!(controller.status().await.state.is_recording_active());
}

#[tokio::test]
async fn run_pumps_backend_events_until_shutdown() {
    let (backend, _clock, controller) = setup();

    let pump = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.run().await })
    };

    // Give the pump a moment to subscribe before pushing.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    backend.push_event(BackendEvent::RecordingStarted);
    backend.push_level(0.6);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let status = controller.status().await;
    assert!(status.state.is_recording_active());
    assert!(status.level > 0.0, "frame loop picked up the pushed level");

    controller.shutdown().await;
    backend.push_event(BackendEvent::RecordingStopped);
    pump.await.unwrap();

    assert!(controller.status().await.state.is_recording_active());
}
