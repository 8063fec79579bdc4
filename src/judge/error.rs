use std::path::PathBuf;

use thiserror::Error;

/// Reasons a judgment could not be obtained. Never escapes the judge client;
/// each variant is folded into a fail-open response.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("judge client is closed")]
    Closed,
    #[error("failed to read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("response has no message content")]
    MissingContent,
}
