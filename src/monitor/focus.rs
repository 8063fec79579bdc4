use anyhow::{Context, Result};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{ImageSource, RetentionPolicy},
    models::{CheckRequest, CheckResponse},
    settings::FocusSettings,
};

use super::Monitor;

/// Checks that the screen matches the user's stated goal.
pub struct FocusMonitor {
    goal: String,
    settings: FocusSettings,
    screen: Arc<dyn ImageSource>,
    retention: RetentionPolicy,
}

impl FocusMonitor {
    pub fn new(
        goal: impl Into<String>,
        settings: FocusSettings,
        screen: Arc<dyn ImageSource>,
        retention: RetentionPolicy,
    ) -> Self {
        let goal = goal.into();
        log::info!("Focus monitor initialized with goal: {}", goal);
        Self {
            goal,
            settings,
            screen,
            retention,
        }
    }
}

#[async_trait]
impl Monitor for FocusMonitor {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn cadence(&self) -> Duration {
        self.settings.interval()
    }

    async fn gather(&self, _cancel: &CancellationToken) -> Result<Option<CheckRequest>> {
        Ok(self
            .screen
            .capture()
            .await
            .map(|path| CheckRequest::focus(self.goal.clone(), path)))
    }

    fn compose_alert(&self, response: &CheckResponse) -> Option<String> {
        if response.verdict {
            return None;
        }
        Some(self.settings.alert_message.replace("{goal}", &self.goal))
    }

    async fn cleanup(&self) -> Result<usize> {
        let policy = self.retention.clone();
        tokio::task::spawn_blocking(move || policy.apply())
            .await
            .context("screenshot cleanup worker join failed")?
    }
}
