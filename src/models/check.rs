use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckKind {
    Focus { goal: String },
    Posture,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Focus { .. } => "focus",
            CheckKind::Posture => "posture",
        }
    }
}

/// One judgment request. Built by a check loop iteration and never mutated.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub id: Uuid,
    pub kind: CheckKind,
    pub images: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
}

impl CheckRequest {
    pub fn focus(goal: impl Into<String>, image: PathBuf) -> Self {
        Self::new(CheckKind::Focus { goal: goal.into() }, vec![image])
    }

    pub fn posture(images: Vec<PathBuf>) -> Self {
        Self::new(CheckKind::Posture, images)
    }

    fn new(kind: CheckKind, images: Vec<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            images,
            created_at: Utc::now(),
        }
    }

    pub fn goal(&self) -> Option<&str> {
        match &self.kind {
            CheckKind::Focus { goal } => Some(goal),
            CheckKind::Posture => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckDetail {
    /// Free-text explanation (focus checks).
    Reason(String),
    /// Discrete issue tags (posture checks).
    Issues(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckResponse {
    /// `true` means on-task / correct posture.
    pub verdict: bool,
    pub confidence: f32,
    pub detail: CheckDetail,
}

impl CheckResponse {
    pub fn new(verdict: bool, confidence: f32, detail: CheckDetail) -> Self {
        Self {
            verdict,
            confidence: confidence.clamp(0.0, 1.0),
            detail,
        }
    }

    pub fn issues(&self) -> &[String] {
        match &self.detail {
            CheckDetail::Issues(issues) => issues,
            CheckDetail::Reason(_) => &[],
        }
    }

    pub fn summary(&self) -> String {
        match &self.detail {
            CheckDetail::Reason(reason) => reason.clone(),
            CheckDetail::Issues(issues) => issues.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_request_carries_goal_and_single_image() {
        let request = CheckRequest::focus("Write documentation", PathBuf::from("/tmp/test.jpg"));
        assert_eq!(request.goal(), Some("Write documentation"));
        assert_eq!(request.images, vec![PathBuf::from("/tmp/test.jpg")]);
        assert_eq!(request.kind.as_str(), "focus");
    }

    #[test]
    fn posture_request_has_no_goal() {
        let request = CheckRequest::posture(vec![
            PathBuf::from("/tmp/img1.jpg"),
            PathBuf::from("/tmp/img2.jpg"),
        ]);
        assert_eq!(request.goal(), None);
        assert_eq!(request.images.len(), 2);
    }

    #[test]
    fn requests_get_distinct_ids() {
        let a = CheckRequest::posture(vec![]);
        let b = CheckRequest::posture(vec![]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn confidence_is_clamped() {
        let response = CheckResponse::new(true, 1.7, CheckDetail::Issues(vec![]));
        assert_eq!(response.confidence, 1.0);
        let response = CheckResponse::new(true, -0.2, CheckDetail::Issues(vec![]));
        assert_eq!(response.confidence, 0.0);
    }

    #[test]
    fn issues_are_empty_for_reason_detail() {
        let response = CheckResponse::new(false, 0.7, CheckDetail::Reason("browsing".into()));
        assert!(response.issues().is_empty());
        assert_eq!(response.summary(), "browsing");
    }
}
