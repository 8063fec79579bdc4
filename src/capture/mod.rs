//! Evidence capture: screenshots for focus checks, webcam frames for posture checks,
//! plus retention of the files they leave behind.

mod retention;
mod screen;
mod webcam;

pub use retention::RetentionPolicy;
pub use screen::ScreenshotCapture;
pub use webcam::WebcamCapture;

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Produces one image file per call. Never fails: any problem yields `None`.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn capture(&self) -> Option<PathBuf>;
}

/// Takes up to `count` shots one after another with `interval` between them.
///
/// Failed shots are skipped, so the result may be shorter than `count`. Cancellation
/// returns whatever was captured so far.
pub async fn capture_batch<S: ImageSource + ?Sized>(
    source: &S,
    count: usize,
    interval: Duration,
    cancel: &CancellationToken,
) -> Vec<PathBuf> {
    let mut images = Vec::with_capacity(count);

    for index in 0..count {
        if index > 0 {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        let shot = tokio::select! {
            shot = source.capture() => shot,
            _ = cancel.cancelled() => break,
        };

        match shot {
            Some(path) => images.push(path),
            None => log_warn!("Failed to capture image {}/{}", index + 1, count),
        }
    }

    images
}

/// True when the file decodes as an image with a non-empty frame.
pub(crate) fn is_usable_image(path: &std::path::Path) -> bool {
    match image::image_dimensions(path) {
        Ok((width, height)) => width > 0 && height > 0,
        Err(err) => {
            log_warn!("Captured file {} is not a readable image: {err}", path.display());
            false
        }
    }
}
