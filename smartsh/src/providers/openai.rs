// smartsh/src/providers/openai.rs
//! Chat-completions client covering OpenAI and the providers that speak
//! its wire shape: OpenAI-compatible servers, DeepSeek, and Azure
//! OpenAI (which differs only in routing and auth header).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{build_user_prompt, ProviderClient, SYSTEM_PROMPT};
use crate::config::Config;

enum AuthHeader {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// Azure's `api-key: <key>`
    ApiKey,
}

pub struct OpenAiClient {
    name: &'static str,
    http: reqwest::Client,
    url: String,
    api_key: String,
    auth: AuthHeader,
    /// Omitted for Azure, where the deployment is part of the URL.
    model: Option<String>,
}

impl OpenAiClient {
    pub fn openai(http: reqwest::Client, config: &Config) -> Result<Self> {
        let provider = config.provider("openai")?;
        Ok(Self {
            name: "openai",
            http,
            url: format!("{}/v1/chat/completions", provider.base_url.trim_end_matches('/')),
            api_key: provider.api_key.clone(),
            auth: AuthHeader::Bearer,
            model: Some(provider.model.clone()),
        })
    }

    pub fn openai_compatible(http: reqwest::Client, config: &Config) -> Result<Self> {
        let provider = config.provider("openai_compatible")?;
        let base = provider.base_url.trim_end_matches('/');
        // A full endpoint path is used verbatim; a bare host gets the
        // standard path appended.
        let url = if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/v1/chat/completions")
        };
        Ok(Self {
            name: "openai_compatible",
            http,
            url,
            api_key: provider.api_key.clone(),
            auth: AuthHeader::Bearer,
            model: Some(provider.model.clone()),
        })
    }

    pub fn deepseek(http: reqwest::Client, config: &Config) -> Result<Self> {
        let provider = config.provider("deepseek")?;
        Ok(Self {
            name: "deepseek",
            http,
            url: format!("{}/chat/completions", provider.base_url.trim_end_matches('/')),
            api_key: provider.api_key.clone(),
            auth: AuthHeader::Bearer,
            model: Some(provider.model.clone()),
        })
    }

    pub fn azure(http: reqwest::Client, config: &Config) -> Result<Self> {
        let azure = config
            .azure_openai
            .as_ref()
            .ok_or_else(|| anyhow!("azure_openai configuration not found"))?;
        if azure.deployment_name.is_empty() {
            return Err(anyhow!("azure_openai deployment name not configured"));
        }
        let base = if !azure.resource_name.is_empty() {
            format!("https://{}.openai.azure.com", azure.resource_name)
        } else if !azure.provider.base_url.is_empty() {
            azure.provider.base_url.trim_end_matches('/').to_string()
        } else {
            return Err(anyhow!(
                "azure_openai requires either resource_name or base_url"
            ));
        };
        Ok(Self {
            name: "azure_openai",
            http,
            url: format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={}",
                azure.deployment_name, azure.provider.api_version
            ),
            api_key: azure.provider.api_key.clone(),
            auth: AuthHeader::ApiKey,
            model: None,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl ProviderClient for OpenAiClient {
    fn name(&self) -> &str {
        self.name
    }

    async fn suggest(&self, context: &str, query: Option<&str>) -> Result<String> {
        let mut body = json!({
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_user_prompt(context, query) },
            ],
            "max_tokens": 256,
            "temperature": 0.2,
        });
        if let Some(model) = &self.model {
            body["model"] = json!(model);
        }

        debug!("requesting suggestion from {}", self.name);
        let mut request = self.http.post(&self.url).json(&body);
        request = match self.auth {
            AuthHeader::Bearer => request.bearer_auth(&self.api_key),
            AuthHeader::ApiKey => request.header("api-key", &self.api_key),
        };

        let response = request
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} returned {status}: {detail}", self.name));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("failed to parse {} response", self.name))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} returned no choices", self.name))?;
        Ok(choice.message.content.trim().to_string())
    }
}
