use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use hushtype_gateway::{Backend, BackendEvent, FakeBackend};
use hushtype_session::{Clock, PopupController, SystemClock};
use hushtype_ui::PopupView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Headless client placeholder. The windowed shell will host the popup
    // controller the same way; until then this drives a scripted session
    // against the in-process backend so the whole stack can be exercised
    // end to end.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HUSHTYPE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let backend = Arc::new(FakeBackend::new());
    let clock = Arc::new(SystemClock::new());
    let controller = PopupController::new(
        backend.clone() as Arc<dyn Backend>,
        clock as Arc<dyn Clock>,
    );

    let pump = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.run().await })
    };

    // Scripted session: record for a moment with live levels, then let the
    // backend walk it through transcription.
    backend.push_event(BackendEvent::RecordingStarted);
    for raw in [0.2_f32, 0.6, 0.9, 0.5, 0.3] {
        backend.push_level(raw);
        tokio::time::sleep(Duration::from_millis(120)).await;
        render(&controller).await;
    }

    backend.push_event(BackendEvent::RecordingTranscribing);
    tokio::time::sleep(Duration::from_millis(120)).await;
    render(&controller).await;

    backend.push_event(BackendEvent::RecordingStopped);
    tokio::time::sleep(Duration::from_millis(120)).await;
    render(&controller).await;

    controller.shutdown().await;
    pump.await?;
    info!("session complete");
    Ok(())
}

async fn render(controller: &PopupController) {
    let view = PopupView::from_status(&controller.status().await);
    info!(
        size = ?view.size,
        headline = %view.headline,
        timer = view.timer.as_deref().unwrap_or("-"),
        meter = view.meter_percent,
        "popup frame"
    );
}
