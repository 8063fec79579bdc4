use crate::models::{CheckDetail, CheckKind, CheckResponse};

const REASON_MAX_CHARS: usize = 200;

/// Turns the model's free-text reply into a verdict.
pub trait VerdictExtractor: Send + Sync {
    fn extract(&self, kind: &CheckKind, reply: &str) -> CheckResponse;
}

/// Case-insensitive substring classifier.
///
/// Any reply containing "focused" counts as focused, "not focused" included.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordExtractor;

const POSTURE_ISSUES: [(&str, &str); 3] = [
    ("slouch", "Slouching detected"),
    ("neck", "Forward head position"),
    ("shoulder", "Uneven shoulders"),
];

impl VerdictExtractor for KeywordExtractor {
    fn extract(&self, kind: &CheckKind, reply: &str) -> CheckResponse {
        let lower = reply.to_lowercase();
        match kind {
            CheckKind::Focus { .. } => {
                let focused = lower.contains("true") || lower.contains("focused");
                let confidence = if focused { 0.8 } else { 0.7 };
                let reason: String = reply.chars().take(REASON_MAX_CHARS).collect();
                CheckResponse::new(focused, confidence, CheckDetail::Reason(reason))
            }
            CheckKind::Posture => {
                let correct = lower.contains("correct") || lower.contains("good");
                let issues = POSTURE_ISSUES
                    .iter()
                    .filter(|(keyword, _)| lower.contains(*keyword))
                    .map(|(_, tag)| tag.to_string())
                    .collect();
                CheckResponse::new(correct, 0.75, CheckDetail::Issues(issues))
            }
        }
    }
}

/// Non-alerting response used whenever the judge could not produce a real verdict.
pub fn fail_open(kind: &CheckKind, error: &dyn std::fmt::Display) -> CheckResponse {
    let message = format!("Error checking {}: {}", kind.as_str(), error);
    let detail = match kind {
        CheckKind::Focus { .. } => CheckDetail::Reason(message),
        CheckKind::Posture => CheckDetail::Issues(vec![message]),
    };
    CheckResponse::new(true, 0.5, detail)
}
