//! Anthropic Messages API client
//!
//! One-shot, non-streaming completion used for offer synthesis.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::LlmClient;
use crate::config::OffersConfig;
use crate::{Error, Result};

/// Thin client for the Anthropic Messages API.
pub struct AnthropicClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a client from configuration.
    ///
    /// Returns `None` when no API key is configured.
    #[must_use]
    pub fn from_config(config: &OffersConfig, http_client: Client) -> Option<Self> {
        let api_key = config.api_key.clone()?;

        Some(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Model request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Model request failed: HTTP {status} - {body}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse model response: {e}")))?;

        value["content"]
            .as_array()
            .and_then(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| {
                        if block["type"].as_str() == Some("text") {
                            block["text"].as_str().map(String::from)
                        } else {
                            None
                        }
                    })
                    .reduce(|acc, text| acc + &text)
            })
            .ok_or_else(|| Error::Internal("Model response contained no text".to_string()))
    }
}
