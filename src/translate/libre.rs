//! LibreTranslate client. Primary backend of the fallback chain.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Language, TranslationBackend};
use crate::config::LibreConfig;
use crate::error::TranslateError;

pub struct LibreTranslateClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// Tracks the next allowed request time.
    next_allowed: tokio::sync::Mutex<Instant>,
    min_interval: Duration,
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateReply {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

impl LibreTranslateClient {
    pub fn new(config: &LibreConfig) -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            next_allowed: tokio::sync::Mutex::new(Instant::now()),
            min_interval: Duration::from_millis(config.min_interval_ms),
        })
    }

    /// Wait until the rate limiter allows a request.
    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateClient {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        if target.is_source() {
            return Err(TranslateError::InvalidInput("target is the source language".into()));
        }
        self.rate_limit_wait().await;

        let body = TranslateBody {
            q: text,
            source: Language::SOURCE.iso_code(),
            target: target.iso_code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let resp = self
            .http
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslateError::Timeout
                } else {
                    TranslateError::Transport(e)
                }
            })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(0);
            return Err(TranslateError::RateLimited { retry_after_ms });
        }
        if !status.is_success() {
            let detail = match resp.json::<ErrorReply>().await {
                Ok(reply) => reply.error,
                Err(_) => String::from("<no body>"),
            };
            return Err(TranslateError::ApiError(format!(
                "status {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        let reply: TranslateReply = resp.json().await?;
        debug!(lang = %target, chars = text.len(), "libretranslate ok");
        Ok(reply.translated_text)
    }
}
