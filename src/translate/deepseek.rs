//! DeepSeek chat/completions client. Secondary backend of the fallback chain,
//! enabled only when an API key is configured.
//! Connection pooling via reqwest, simple token-bucket rate limiting.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Language, TranslationBackend};
use crate::error::TranslateError;

/// System prompt kept under 60 tokens.
const SYSTEM_PROMPT: &str = "You are a translator for a museum website. Output only the translation, nothing else.";

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    /// Simple token-bucket: tracks the next allowed request time.
    next_allowed: tokio::sync::Mutex<Instant>,
    /// Minimum interval between requests (e.g. 100ms = 10 req/s).
    min_interval: Duration,
}

impl DeepSeekClient {
    pub fn new(api_key: String) -> Result<Self, TranslateError> {
        if api_key.trim().is_empty() {
            return Err(TranslateError::InvalidInput("empty DeepSeek API key".into()));
        }

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: "https://api.deepseek.com".into(),
            next_allowed: tokio::sync::Mutex::new(Instant::now()),
            min_interval: Duration::from_millis(100), // 10 req/s
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
impl TranslationBackend for DeepSeekClient {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    async fn translate(&self, text: &str, target: Language) -> Result<String, TranslateError> {
        self.rate_limit_wait().await;

        let body = serde_json::json!({
            "model": "deepseek-chat",
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": build_user_prompt(text, target)}
            ],
            "max_tokens": estimate_max_tokens(text),
            "stream": false,
            "temperature": 0.1
        });

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
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
            warn!("deepseek rate limited");
            return Err(TranslateError::RateLimited { retry_after_ms: 0 });
        }
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(TranslateError::ApiError(format!(
                "unexpected status {}: {}",
                status,
                body_text.chars().take(200).collect::<String>()
            )));
        }

        let completion: Completion = resp.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslateError::ApiError("completion without content".into()))?;

        if let Some(usage) = completion.usage {
            debug!(tokens = usage.total_tokens, lang = %target, "deepseek ok");
        }
        Ok(content.trim().to_string())
    }
}

/// Compact user prompt: {"t":"text","l":"Language"}
fn build_user_prompt(text: &str, target: Language) -> String {
    serde_json::json!({ "t": text, "l": target.english_name() }).to_string()
}

/// Estimate max_tokens: (input_tokens * 1.15 + 32), capped at 768.
fn estimate_max_tokens(text: &str) -> u32 {
    // Rough: ~4 chars/token for Latin, ~1.5 for Indic scripts
    let estimated_input_tokens = text.len() as f64 / 3.0;
    let max = (estimated_input_tokens * 1.15 + 32.0) as u32;
    max.clamp(64, 768)
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_valid_json_with_language_name() {
        let prompt = build_user_prompt("Say \"hi\"\n", Language::Fn);
        let parsed: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(parsed["t"], "Say \"hi\"\n");
        assert_eq!(parsed["l"], "French");
    }

    #[test]
    fn max_tokens_is_clamped() {
        assert_eq!(estimate_max_tokens("hi"), 64);
        assert_eq!(estimate_max_tokens(&"x".repeat(10_000)), 768);
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(DeepSeekClient::new("  ".into()).is_err());
    }
}
