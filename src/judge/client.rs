use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::{
    models::{CheckRequest, CheckResponse},
    settings::JudgeSettings,
};

use super::{
    error::JudgeError,
    prompts,
    verdict::{fail_open, KeywordExtractor, VerdictExtractor},
    Judge,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Chat-completions client for an OpenAI-compatible vision endpoint (LM Studio by default).
pub struct VisionJudgeClient {
    http: RwLock<Option<Client>>,
    settings: JudgeSettings,
    extractor: Box<dyn VerdictExtractor>,
}

impl VisionJudgeClient {
    pub fn new(settings: JudgeSettings) -> Result<Self> {
        Self::with_extractor(settings, Box::new(KeywordExtractor))
    }

    pub fn with_extractor(
        settings: JudgeSettings,
        extractor: Box<dyn VerdictExtractor>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("failed to build judge HTTP client")?;

        log_info!(
            "Initialized judge client with base URL: {} (model {})",
            settings.base_url,
            settings.model
        );

        Ok(Self {
            http: RwLock::new(Some(http)),
            settings,
            extractor,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn http(&self) -> Result<Client, JudgeError> {
        // reqwest clients are cheap handles onto a shared pool.
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(JudgeError::Closed)
    }

    async fn encode_images(request: &CheckRequest) -> Result<Vec<Value>, JudgeError> {
        let mut parts = Vec::with_capacity(request.images.len());
        for path in &request.images {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| JudgeError::Image {
                    path: path.clone(),
                    source,
                })?;
            parts.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)) },
            }));
        }
        Ok(parts)
    }

    async fn request_verdict(&self, request: &CheckRequest) -> Result<CheckResponse, JudgeError> {
        let http = self.http()?;

        let mut content = vec![json!({ "type": "text", "text": prompts::render(&request.kind) })];
        content.extend(Self::encode_images(request).await?);

        let body = json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": content }],
            "max_tokens": self.settings.max_tokens,
        });

        let response = http
            .post(self.endpoint("chat/completions"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(JudgeError::Status { status, body: text });
        }

        let raw: Value = serde_json::from_str(&text)?;
        let reply = raw["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(JudgeError::MissingContent)?;

        Ok(self.extractor.extract(&request.kind, reply))
    }
}

#[async_trait]
impl Judge for VisionJudgeClient {
    async fn judge(&self, request: &CheckRequest) -> CheckResponse {
        let started = Instant::now();
        match self.request_verdict(request).await {
            Ok(response) => {
                log_debug!(
                    "{} check {} judged in {}ms: verdict={} confidence={:.2}",
                    request.kind.as_str(),
                    request.id,
                    started.elapsed().as_millis(),
                    response.verdict,
                    response.confidence
                );
                response
            }
            Err(err) => {
                log_error!(
                    "{} check {} failed after {}ms: {err}",
                    request.kind.as_str(),
                    request.id,
                    started.elapsed().as_millis()
                );
                fail_open(&request.kind, &err)
            }
        }
    }

    async fn verify_reachable(&self) -> bool {
        let http = match self.http() {
            Ok(http) => http,
            Err(err) => {
                log_error!("Cannot probe judge endpoint: {err}");
                return false;
            }
        };

        match http.get(self.endpoint("models")).send().await {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                log_warn!(
                    "Judge endpoint {} answered {}",
                    self.settings.base_url,
                    response.status()
                );
                false
            }
            Err(err) => {
                log_error!("Failed to connect to judge at {}: {err}", self.settings.base_url);
                false
            }
        }
    }

    async fn close(&self) {
        let previous = self
            .http
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            log_info!("Judge client closed");
        }
    }
}
