use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::monitor::{CheckLoop, LoopStats};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Owns one check loop's task and the token that can interrupt it.
pub struct LoopController {
    check_loop: Arc<CheckLoop>,
    handle: Option<JoinHandle<LoopStats>>,
    cancel_token: CancellationToken,
}

impl LoopController {
    /// Spawns the loop. `parent` cancellation propagates to this loop.
    pub fn start(check_loop: Arc<CheckLoop>, parent: &CancellationToken) -> Self {
        let cancel_token = parent.child_token();
        let handle = tokio::spawn({
            let check_loop = Arc::clone(&check_loop);
            let token = cancel_token.clone();
            async move { check_loop.run(token).await }
        });

        Self {
            check_loop,
            handle: Some(handle),
            cancel_token,
        }
    }

    /// Cooperative stop first, then the cancellation backstop for a suspended iteration.
    pub fn request_stop(&self) {
        self.check_loop.stop();
        self.cancel_token.cancel();
    }

    /// Waits for the task to end. Join errors are logged, never returned.
    pub async fn join(&mut self) -> LoopStats {
        let Some(handle) = self.handle.take() else {
            return LoopStats::default();
        };

        match handle.await {
            Ok(stats) => stats,
            Err(err) if err.is_cancelled() => {
                log_info!("{} loop task cancelled", self.check_loop.name());
                LoopStats::default()
            }
            Err(err) => {
                log_error!("{} loop task failed to join: {err}", self.check_loop.name());
                LoopStats::default()
            }
        }
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.cancel_token.cancel();
            handle.abort();
        }
    }
}
