use anyhow::Result;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{announcer::AnnouncerHandle, judge::Judge};

use super::{LoopPhase, LoopState, Monitor};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub judged: u64,
    pub skipped: u64,
    pub failed: u64,
    pub alerts: u64,
}

enum IterationOutcome {
    /// Capture produced nothing; no judge call was made.
    Skipped,
    Judged { alerted: bool },
}

/// Periodic capture → judge → react → cleanup cycle shared by both monitors.
///
/// Iterations are strictly sequential. An error anywhere inside an iteration is
/// logged and the loop carries on after its normal pause; only [`CheckLoop::stop`]
/// or cancelling the token passed to [`CheckLoop::run`] ends it.
pub struct CheckLoop {
    monitor: Arc<dyn Monitor>,
    judge: Arc<dyn Judge>,
    announcer: AnnouncerHandle,
    state: LoopState,
}

impl CheckLoop {
    pub fn new(monitor: Arc<dyn Monitor>, judge: Arc<dyn Judge>, announcer: AnnouncerHandle) -> Self {
        Self {
            monitor,
            judge,
            announcer,
            state: LoopState::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.monitor.name()
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Cooperative stop, observed at the next iteration boundary.
    pub fn stop(&self) {
        log_info!("Stopping {} monitoring...", self.name());
        self.state.request_stop();
    }

    /// Runs until stopped or cancelled. Returns immediately if this loop already ran.
    pub async fn run(&self, cancel: CancellationToken) -> LoopStats {
        let mut stats = LoopStats::default();
        let name = self.name();

        if !self.state.begin() {
            log_warn!("{} loop not started: already running or stopped", name);
            return stats;
        }
        log_info!("Starting {} monitoring...", name);

        while self.state.is_running() {
            let outcome = tokio::select! {
                outcome = self.run_iteration(&cancel) => outcome,
                _ = cancel.cancelled() => break,
            };
            stats.iterations += 1;

            match outcome {
                Ok(IterationOutcome::Skipped) => {
                    stats.skipped += 1;
                    log_warn!("{} capture produced no images, skipping check", name);
                }
                Ok(IterationOutcome::Judged { alerted }) => {
                    stats.judged += 1;
                    if alerted {
                        stats.alerts += 1;
                    }
                }
                Err(err) => {
                    stats.failed += 1;
                    log_error!("Error in {} monitoring loop: {err:#}", name);
                }
            }

            if !self.state.is_running() {
                break;
            }

            self.state.set_phase(LoopPhase::Sleeping);
            tokio::select! {
                _ = tokio::time::sleep(self.monitor.cadence()) => {}
                _ = cancel.cancelled() => break,
            }
        }

        self.state.finish();
        log_info!(
            "{} loop shutting down after {} iterations ({} judged, {} skipped, {} failed, {} alerts)",
            name,
            stats.iterations,
            stats.judged,
            stats.skipped,
            stats.failed,
            stats.alerts
        );
        stats
    }

    async fn run_iteration(&self, cancel: &CancellationToken) -> Result<IterationOutcome> {
        let started = Instant::now();
        let outcome = self.check_once(cancel).await?;

        let removed = self.monitor.cleanup().await?;
        if removed > 0 {
            log_debug!("{} cleanup removed {} old captures", self.name(), removed);
        }

        log_debug!(
            "{} iteration finished in {}ms",
            self.name(),
            started.elapsed().as_millis()
        );
        Ok(outcome)
    }

    async fn check_once(&self, cancel: &CancellationToken) -> Result<IterationOutcome> {
        let name = self.name();

        self.state.set_phase(LoopPhase::Capturing);
        let Some(request) = self.monitor.gather(cancel).await? else {
            return Ok(IterationOutcome::Skipped);
        };
        log_debug!(
            "Performing {} check {} with {} images",
            name,
            request.id,
            request.images.len()
        );

        self.state.set_phase(LoopPhase::Judging);
        let response = self.judge.judge(&request).await;

        self.state.set_phase(LoopPhase::Reacting);
        let alerted = match self.monitor.compose_alert(&response) {
            Some(message) => {
                log_warn!("{} check negative: {}", name, response.summary());
                self.announcer.announce(message);
                true
            }
            None => {
                log_info!("{} check passed (confidence: {:.2})", name, response.confidence);
                false
            }
        };

        Ok(IterationOutcome::Judged { alerted })
    }
}
