use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;

use super::{is_usable_image, ImageSource, RetentionPolicy};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

pub const SCREENSHOT_PATTERN: &str = "screenshot_*.jpg";

/// Full-display screenshots through the macOS `screencapture` tool.
pub struct ScreenshotCapture {
    save_dir: PathBuf,
    program: String,
}

impl ScreenshotCapture {
    pub fn new(save_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_program(save_dir, "screencapture")
    }

    pub fn with_program(save_dir: impl Into<PathBuf>, program: impl Into<String>) -> Result<Self> {
        let save_dir = save_dir.into();
        std::fs::create_dir_all(&save_dir)
            .with_context(|| format!("Failed to create screenshot dir {}", save_dir.display()))?;
        log_info!("Screenshot capture initialized, saving to: {}", save_dir.display());
        Ok(Self {
            save_dir,
            program: program.into(),
        })
    }

    pub fn retention(&self, keep_last: usize) -> RetentionPolicy {
        RetentionPolicy::new(&self.save_dir, SCREENSHOT_PATTERN, keep_last)
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        self.save_dir.join(format!("screenshot_{stamp}.jpg"))
    }
}

#[async_trait]
impl ImageSource for ScreenshotCapture {
    async fn capture(&self) -> Option<PathBuf> {
        let output_path = self.next_path();

        // -x: no shutter sound, -t jpg: output format
        let output = Command::new(&self.program)
            .args(["-x", "-t", "jpg"])
            .arg(&output_path)
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                log_error!(
                    "Screenshot capture failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return None;
            }
            Err(err) => {
                log_error!("Failed to run {}: {err}", self.program);
                return None;
            }
        }

        if !output_path.exists() {
            log_error!("Screenshot file was not created");
            return None;
        }
        if !is_usable_image(&output_path) {
            return None;
        }

        log_debug!("Screenshot saved: {}", output_path.display());
        Some(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_tool_yields_none() {
        let dir = TempDir::new().unwrap();
        let capture =
            ScreenshotCapture::with_program(dir.path(), "angeleyes-no-such-screencapture").unwrap();
        assert!(capture.capture().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_yields_none() {
        let dir = TempDir::new().unwrap();
        let capture = ScreenshotCapture::with_program(dir.path(), "false").unwrap();
        assert!(capture.capture().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tool_that_writes_nothing_yields_none() {
        let dir = TempDir::new().unwrap();
        let capture = ScreenshotCapture::with_program(dir.path(), "true").unwrap();
        assert!(capture.capture().await.is_none());
    }

    #[test]
    fn creates_save_dir_and_names_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("shots");
        let capture = ScreenshotCapture::new(&nested).unwrap();
        assert!(nested.is_dir());

        let name = capture.next_path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "screenshot_20240101_120000.jpg".len());
    }
}
