mod controller;
mod signals;

pub use controller::LoopController;
pub use signals::spawn_signal_listener;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    announcer::{Announcer, SaySpeaker, Speaker},
    capture::{ScreenshotCapture, WebcamCapture},
    judge::{Judge, VisionJudgeClient},
    monitor::{CheckLoop, FocusMonitor, LoopPhase, LoopStats, Monitor, PostureMonitor},
    settings::AppConfig,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("vision judge is unreachable; make sure the model server is running")]
    JudgeUnreachable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub focus: LoopStats,
    pub posture: LoopStats,
}

/// Wires the judge, both monitors and the announcer together and owns their lifetime.
pub struct Orchestrator {
    judge: Arc<dyn Judge>,
    focus: Arc<dyn Monitor>,
    posture: Arc<dyn Monitor>,
    speaker: Arc<dyn Speaker>,
    shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        judge: Arc<dyn Judge>,
        focus: Arc<dyn Monitor>,
        posture: Arc<dyn Monitor>,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        Self {
            judge,
            focus,
            posture,
            speaker,
            shutdown: CancellationToken::new(),
        }
    }

    /// Builds the production components: HTTP judge, screen and webcam capture, `say`.
    pub fn from_config(config: &AppConfig, goal: impl Into<String>) -> Result<Self> {
        let judge = VisionJudgeClient::new(config.judge.clone())
            .context("Failed to build vision judge client")?;

        let screen = ScreenshotCapture::new(&config.screenshot_dir)?;
        let screen_retention = screen.retention(config.focus.keep_last);
        let focus = FocusMonitor::new(
            goal,
            config.focus.clone(),
            Arc::new(screen),
            screen_retention,
        );

        let camera = WebcamCapture::new(&config.webcam_dir, config.posture.camera_device.clone())?;
        let camera_retention = camera.retention(config.posture.keep_last);
        let posture = PostureMonitor::new(config.posture.clone(), Arc::new(camera), camera_retention);

        Ok(Self::new(
            Arc::new(judge),
            Arc::new(focus),
            Arc::new(posture),
            Arc::new(SaySpeaker::new(&config.voice)),
        ))
    }

    /// Cancelling this token runs the stop sequence. Safe to hand to signal handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Probes the judge, then runs both loops until shutdown is requested or both loops end.
    ///
    /// An unreachable judge is a startup failure: no loop is started and no capture
    /// is taken. Once running, every exit path goes through the same stop sequence.
    pub async fn run(self) -> Result<RunSummary> {
        log_info!("Verifying vision judge connection...");
        if !self.judge.verify_reachable().await {
            log_error!("Vision judge is not reachable, aborting startup");
            self.judge.close().await;
            return Err(StartupError::JudgeUnreachable.into());
        }
        log_info!("Vision judge connection verified");

        let announcer = Announcer::spawn(Arc::clone(&self.speaker));

        let focus_loop = Arc::new(CheckLoop::new(
            Arc::clone(&self.focus),
            Arc::clone(&self.judge),
            announcer.handle(),
        ));
        let posture_loop = Arc::new(CheckLoop::new(
            Arc::clone(&self.posture),
            Arc::clone(&self.judge),
            announcer.handle(),
        ));

        let loops_token = CancellationToken::new();
        let mut focus = LoopController::start(Arc::clone(&focus_loop), &loops_token);
        let mut posture = LoopController::start(Arc::clone(&posture_loop), &loops_token);
        log_info!("AngelEyes is running. Press Ctrl+C to stop.");

        let both_finished = async {
            let mut focus_phase = focus_loop.state().subscribe();
            let mut posture_phase = posture_loop.state().subscribe();
            let _ = focus_phase.wait_for(|p| *p == LoopPhase::Stopped).await;
            let _ = posture_phase.wait_for(|p| *p == LoopPhase::Stopped).await;
        };

        tokio::select! {
            _ = self.shutdown.cancelled() => log_info!("Shutting down AngelEyes..."),
            _ = both_finished => log_info!("Both monitoring loops finished"),
        }

        focus.request_stop();
        posture.request_stop();
        let summary = RunSummary {
            focus: focus.join().await,
            posture: posture.join().await,
        };

        announcer.shutdown().await;
        self.judge.close().await;
        log_info!("AngelEyes stopped");

        Ok(summary)
    }
}
