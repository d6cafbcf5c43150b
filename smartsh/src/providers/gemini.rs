// smartsh/src/providers/gemini.rs
//! Gemini generateContent client.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{build_user_prompt, ProviderClient, SYSTEM_PROMPT};
use crate::config::Config;

pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Result<Self> {
        let provider = config.provider("gemini")?;
        // Models may be configured as "gemini-*" or "models/gemini-*".
        let model = provider
            .model
            .strip_prefix("models/")
            .unwrap_or(&provider.model);
        Ok(Self {
            http,
            url: format!(
                "{}/v1beta/models/{model}:generateContent",
                provider.base_url.trim_end_matches('/')
            ),
            api_key: provider.api_key.clone(),
        })
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ProviderClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn suggest(&self, context: &str, query: Option<&str>) -> Result<String> {
        let body = json!({
            "system_instruction": { "parts": [ { "text": SYSTEM_PROMPT } ] },
            "contents": [
                { "parts": [ { "text": build_user_prompt(context, query) } ] },
            ],
        });

        debug!("requesting suggestion from gemini");
        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("gemini returned {status}: {detail}"));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed to parse gemini response")?;
        let text = parsed
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .map(|part| part.text)
            .find(|text| !text.is_empty())
            .ok_or_else(|| anyhow!("gemini returned no text content"))?;
        Ok(text.trim().to_string())
    }
}
