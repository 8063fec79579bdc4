use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{capture_batch, ImageSource, RetentionPolicy},
    models::{CheckRequest, CheckResponse},
    settings::PostureSettings,
};

use super::Monitor;

/// Checks posture from a short series of webcam frames spread over one check period.
pub struct PostureMonitor {
    settings: PostureSettings,
    camera: Arc<dyn ImageSource>,
    retention: RetentionPolicy,
}

impl PostureMonitor {
    pub fn new(
        settings: PostureSettings,
        camera: Arc<dyn ImageSource>,
        retention: RetentionPolicy,
    ) -> Self {
        log::info!(
            "Posture monitor initialized ({} images every {}s)",
            settings.images_per_check,
            settings.check_interval
        );
        Self {
            settings,
            camera,
            retention,
        }
    }
}

#[async_trait]
impl Monitor for PostureMonitor {
    fn name(&self) -> &'static str {
        "posture"
    }

    /// One image gap: shots stay evenly spaced across consecutive batches.
    fn cadence(&self) -> Duration {
        self.settings.image_interval()
    }

    async fn gather(&self, cancel: &CancellationToken) -> Result<Option<CheckRequest>> {
        let images = capture_batch(
            self.camera.as_ref(),
            self.settings.images_per_check,
            self.settings.image_interval(),
            cancel,
        )
        .await;

        if images.is_empty() {
            return Ok(None);
        }
        Ok(Some(CheckRequest::posture(images)))
    }

    fn compose_alert(&self, response: &CheckResponse) -> Option<String> {
        if response.verdict {
            return None;
        }
        match response.issues().first() {
            Some(issue) => Some(format!("Please check your posture. {issue}")),
            None => Some(self.settings.fallback_message.clone()),
        }
    }

    async fn cleanup(&self) -> Result<usize> {
        let policy = self.retention.clone();
        tokio::task::spawn_blocking(move || policy.apply())
            .await
            .context("webcam cleanup worker join failed")?
    }
}
