use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Cancels `shutdown` on SIGINT or SIGTERM. The listener does nothing else, so the
/// stop sequence always runs on the orchestrator's own task.
pub fn spawn_signal_listener(shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                log_info!("Received {}, initiating shutdown...", signal);
                shutdown.cancel();
            }
            _ = shutdown.cancelled() => {}
        }
    })
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log_error!("Failed to listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(err) => {
            log_error!("Failed to listen for SIGTERM: {err}");
            ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await;
    "Ctrl+C"
}
