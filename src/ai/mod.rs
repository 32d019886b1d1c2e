pub mod parse;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::EngineError;

/// One entry of a chat-style completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Boundary to the external text-generation service. Responses are
/// free-form text; callers parse defensively via [`parse`].
#[async_trait]
pub trait TextGenClient: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, EngineError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct GenerateResponse {
    completion: String,
}

/// HTTP implementation with a request timeout and a small bounded retry
/// loop with fixed backoff. Never holds any engine lock while suspended.
pub struct HttpTextGen {
    http: reqwest::Client,
    url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpTextGen {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            url: format!("{}/text/llm/", config.base_url.trim_end_matches('/')),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn request_once(&self, messages: &[ChatMessage]) -> Result<String, EngineError> {
        let response = self
            .http
            .post(&self.url)
            .json(&GenerateRequest { messages })
            .send()
            .await
            .map_err(|e| EngineError::degraded(format!("text generation request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(EngineError::degraded(format!(
                "text generation returned status {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| EngineError::degraded(format!("text generation bad payload: {e}")))?;
        Ok(body.completion)
    }
}

#[async_trait]
impl TextGenClient for HttpTextGen {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, EngineError> {
        let mut last_err = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }
            match self.request_once(messages).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "text generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "text generation attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| EngineError::degraded("text generation failed with no attempts")))
    }
}
