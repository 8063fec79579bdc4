use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::{is_usable_image, ImageSource, RetentionPolicy};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

pub const WEBCAM_PATTERN: &str = "webcam_*.jpg";

/// Seconds the camera runs before the frame is taken, letting exposure settle.
const WARMUP_SECS: &str = "1.0";

/// Single webcam frames through the macOS `imagesnap` tool.
///
/// Opening the camera blocks on the device driver, so every shot runs on the
/// blocking pool and the device is released when the tool exits.
pub struct WebcamCapture {
    save_dir: PathBuf,
    device: Option<String>,
    program: String,
}

impl WebcamCapture {
    pub fn new(save_dir: impl Into<PathBuf>, device: Option<String>) -> Result<Self> {
        Self::with_program(save_dir, device, "imagesnap")
    }

    pub fn with_program(
        save_dir: impl Into<PathBuf>,
        device: Option<String>,
        program: impl Into<String>,
    ) -> Result<Self> {
        let save_dir = save_dir.into();
        std::fs::create_dir_all(&save_dir)
            .with_context(|| format!("Failed to create webcam dir {}", save_dir.display()))?;
        log_info!("Webcam capture initialized, saving to: {}", save_dir.display());
        Ok(Self {
            save_dir,
            device,
            program: program.into(),
        })
    }

    pub fn retention(&self, keep_last: usize) -> RetentionPolicy {
        RetentionPolicy::new(&self.save_dir, WEBCAM_PATTERN, keep_last)
    }

    fn next_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        self.save_dir.join(format!("webcam_{stamp}.jpg"))
    }
}

fn snap_frame(program: &str, device: Option<&str>, output_path: &Path) -> Result<()> {
    let mut command = Command::new(program);
    command.arg("-q").args(["-w", WARMUP_SECS]);
    if let Some(device) = device {
        command.args(["-d", device]);
    }
    let output = command
        .arg(output_path)
        .output()
        .with_context(|| format!("failed to run {program}"))?;

    if !output.status.success() {
        anyhow::bail!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    if !output_path.exists() {
        anyhow::bail!("{program} did not write {}", output_path.display());
    }
    Ok(())
}

#[async_trait]
impl ImageSource for WebcamCapture {
    async fn capture(&self) -> Option<PathBuf> {
        let output_path = self.next_path();
        let program = self.program.clone();
        let device = self.device.clone();

        let result = tokio::task::spawn_blocking({
            let output_path = output_path.clone();
            move || snap_frame(&program, device.as_deref(), &output_path)
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log_error!("Failed to capture webcam image: {err:#}");
                return None;
            }
            Err(err) => {
                log_error!("webcam capture worker join failed: {err}");
                return None;
            }
        }

        if !is_usable_image(&output_path) {
            return None;
        }

        log_debug!("Webcam image saved: {}", output_path.display());
        Some(output_path)
    }
}
