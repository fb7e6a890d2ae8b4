use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

/// A content-moderation verdict source.
///
/// `moderate` returns `true` only when the text is known to be safe. Any
/// failure to obtain a verdict counts as unsafe.
#[async_trait]
pub trait ContentModeration: Send + Sync {
    async fn moderate(&self, text: &str) -> bool;
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    #[serde(default)]
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    #[serde(default)]
    flagged: bool,
}

pub struct ModerationClient {
    config: ModerationConfig,
    http: reqwest::Client,
}

impl ModerationClient {
    pub fn new(config: ModerationConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Ask the moderation endpoint whether `text` is flagged.
    pub async fn is_flagged(&self, text: &str) -> Result<bool> {
        let url = format!("{}/moderations", self.config.base_url.trim_end_matches('/'));

        let mut req_builder = self.http.post(&url).json(&json!({ "input": text }));
        if let Some(api_key) = &self.config.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send moderation request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Moderation request failed ({}): {}", status, error_text);
        }

        let body: ModerationResponse = response
            .json()
            .await
            .context("Failed to parse moderation response")?;

        let first = body
            .results
            .first()
            .context("Moderation response contained no results")?;
        Ok(first.flagged)
    }
}

#[async_trait]
impl ContentModeration for ModerationClient {
    async fn moderate(&self, text: &str) -> bool {
        match self.is_flagged(text).await {
            Ok(false) => true,
            Ok(true) => {
                info!("Prompt flagged by moderation");
                false
            }
            Err(e) => {
                warn!("Moderation unavailable, treating prompt as unsafe: {:#}", e);
                false
            }
        }
    }
}
