pub mod focus;
pub mod loop_worker;
pub mod posture;
pub mod state;

pub use focus::FocusMonitor;
pub use loop_worker::{CheckLoop, LoopStats};
pub use posture::PostureMonitor;
pub use state::{LoopPhase, LoopState};

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::{CheckRequest, CheckResponse};

/// The monitor-specific half of a check loop: what to capture, how to phrase an alert,
/// and which capture files to clean up. Timing, judging and fault containment live
/// in [`CheckLoop`].
#[async_trait]
pub trait Monitor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pause between the end of one iteration and the start of the next.
    fn cadence(&self) -> Duration;

    /// Captures evidence and builds a request. `Ok(None)` means nothing was captured.
    async fn gather(&self, cancel: &CancellationToken) -> Result<Option<CheckRequest>>;

    /// Alert text for a negative verdict, `None` when no alert is due.
    fn compose_alert(&self, response: &CheckResponse) -> Option<String>;

    /// Applies capture retention. Returns how many files were deleted.
    async fn cleanup(&self) -> Result<usize>;
}
