//! Spoken alerts. Every message goes through one queue drained by one task, so two
//! alerts never talk over each other and they are spoken in the order they arrived.

mod speaker;

pub use speaker::{SaySpeaker, Speaker};

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Cheap, cloneable enqueue side. `announce` never waits for speech.
#[derive(Clone)]
pub struct AnnouncerHandle {
    tx: mpsc::UnboundedSender<String>,
}

impl AnnouncerHandle {
    pub fn announce(&self, message: impl Into<String>) {
        if let Err(err) = self.tx.send(message.into()) {
            log_warn!("Announcer stopped; dropping alert: {}", err.0);
        }
    }
}

pub struct Announcer {
    handle: AnnouncerHandle,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Announcer {
    /// Starts the drain task on the current runtime.
    pub fn spawn(speaker: Arc<dyn Speaker>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(drain(rx, speaker, cancel.clone()));

        Self {
            handle: AnnouncerHandle { tx },
            worker,
            cancel,
        }
    }

    pub fn handle(&self) -> AnnouncerHandle {
        self.handle.clone()
    }

    /// Stops the drain. Queued messages are dropped and a message being spoken is cut off.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.worker.await {
            if !err.is_cancelled() {
                log_error!("announcer task failed: {err}");
            }
        }
    }
}

async fn drain(
    mut rx: mpsc::UnboundedReceiver<String>,
    speaker: Arc<dyn Speaker>,
    cancel: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        log_debug!("Speaking: {}", message);
        tokio::select! {
            result = speaker.speak(&message) => {
                if let Err(err) = result {
                    log_error!("Failed to speak message: {err:#}");
                }
            }
            _ = cancel.cancelled() => break,
        }
    }

    let dropped = rx.len();
    if dropped > 0 {
        log_info!("Announcer stopped with {} unspoken alerts", dropped);
    }
}
