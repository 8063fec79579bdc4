use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Running,
    Capturing,
    Judging,
    Reacting,
    Sleeping,
    Stopped,
}

impl Default for LoopPhase {
    fn default() -> Self {
        LoopPhase::Idle
    }
}

impl LoopPhase {
    pub fn is_active(self) -> bool {
        !matches!(self, LoopPhase::Idle | LoopPhase::Stopped)
    }
}

/// Per-loop lifecycle: the cooperative `running` flag plus an observable phase.
///
/// Transitions happen under the watch channel's lock so a stop request can never be
/// overwritten by a concurrent start.
pub struct LoopState {
    running: AtomicBool,
    phase: watch::Sender<LoopPhase>,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopState {
    pub fn new() -> Self {
        let (phase, _) = watch::channel(LoopPhase::Idle);
        Self {
            running: AtomicBool::new(false),
            phase,
        }
    }

    /// `Idle → Running`. Returns false if the loop already ran or was stopped before starting.
    pub fn begin(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase != LoopPhase::Idle {
                return false;
            }
            *phase = LoopPhase::Running;
            self.running.store(true, Ordering::SeqCst);
            true
        })
    }

    /// Clears the running flag; the loop notices at its next iteration boundary.
    pub fn request_stop(&self) {
        self.phase.send_if_modified(|phase| {
            self.running.store(false, Ordering::SeqCst);
            if *phase == LoopPhase::Idle {
                *phase = LoopPhase::Stopped;
                return true;
            }
            false
        });
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_phase(&self, next: LoopPhase) {
        self.phase.send_if_modified(|phase| {
            if *phase == LoopPhase::Stopped || *phase == next {
                return false;
            }
            *phase = next;
            true
        });
    }

    pub fn finish(&self) {
        self.phase.send_if_modified(|phase| {
            self.running.store(false, Ordering::SeqCst);
            let changed = *phase != LoopPhase::Stopped;
            *phase = LoopPhase::Stopped;
            changed
        });
    }

    pub fn phase(&self) -> LoopPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoopPhase> {
        self.phase.subscribe()
    }
}
