// smartsh/src/providers/anthropic.rs
//! Anthropic messages-API client.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{build_user_prompt, ProviderClient, SYSTEM_PROMPT};
use crate::config::Config;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Result<Self> {
        let provider = config.provider("anthropic")?;
        Ok(Self {
            http,
            url: format!("{}/v1/messages", provider.base_url.trim_end_matches('/')),
            api_key: provider.api_key.clone(),
            model: provider.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ProviderClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn suggest(&self, context: &str, query: Option<&str>) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": 256,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": build_user_prompt(context, query) },
            ],
        });

        debug!("requesting suggestion from anthropic");
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("anthropic returned {status}: {detail}"));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("failed to parse anthropic response")?;
        let block = parsed
            .content
            .into_iter()
            .find(|block| !block.text.is_empty())
            .ok_or_else(|| anyhow!("anthropic returned no text content"))?;
        Ok(block.text.trim().to_string())
    }
}
