mod client;
mod error;
pub mod prompts;
mod verdict;

pub use client::VisionJudgeClient;
pub use error::JudgeError;
pub use verdict::{fail_open, KeywordExtractor, VerdictExtractor};

use async_trait::async_trait;

use crate::models::{CheckRequest, CheckResponse};

/// Renders verdicts for check loops. Shared by both loops; implementations keep no
/// per-call state beyond what a single `judge` invocation owns.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Never fails: infrastructure problems produce a fail-open response.
    async fn judge(&self, request: &CheckRequest) -> CheckResponse;

    /// Startup probe. `false` aborts the application.
    async fn verify_reachable(&self) -> bool;

    /// Releases connections. Later `judge` calls fail open.
    async fn close(&self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::CheckKind;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
        time::Duration,
    };

    /// Judge that answers from a script of raw model replies and records every request.
    /// Once the script runs out it keeps returning the last reply.
    #[derive(Default)]
    pub struct ScriptedJudge {
        replies: Mutex<VecDeque<String>>,
        last: Mutex<Option<String>>,
        pub requests: Mutex<Vec<CheckRequest>>,
        pub reachable: bool,
        pub delay: Duration,
        pub probed: AtomicBool,
        pub closed: AtomicBool,
    }

    impl ScriptedJudge {
        pub fn replying(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                reachable: true,
                ..Self::default()
            }
        }

        pub fn unreachable() -> Self {
            Self::default()
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn kinds(&self) -> Vec<CheckKind> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.kind.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Judge for ScriptedJudge {
        async fn judge(&self, request: &CheckRequest) -> CheckResponse {
            self.requests.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let reply = {
                let mut last = self.last.lock().unwrap();
                if let Some(next) = self.replies.lock().unwrap().pop_front() {
                    *last = Some(next);
                }
                last.clone()
            };
            match reply {
                Some(reply) => KeywordExtractor.extract(&request.kind, &reply),
                None => fail_open(&request.kind, &"no scripted reply"),
            }
        }

        async fn verify_reachable(&self) -> bool {
            self.probed.store(true, Ordering::SeqCst);
            self.reachable
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}
