// smartsh/src/providers/mod.rs
//! AI provider clients.
//!
//! The core hands every provider exactly one redacted context string;
//! everything HTTP- and provider-specific lives behind the
//! [`ProviderClient`] trait, selected by configuration. Adding a
//! provider means adding a client here, nothing in the capture or
//! redaction pipeline changes.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::config::Config;
use anthropic::AnthropicClient;
use gemini::GeminiClient;
use openai::OpenAiClient;

/// Per-request timeout for every provider call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The instruction sent alongside the redacted context.
pub(crate) const SYSTEM_PROMPT: &str = "You are a shell command assistant. Based on the user's \
recent terminal activity and shell history, suggest the single most useful next shell command. \
Respond with only the command, no explanation and no code fences.";

/// A pluggable AI provider.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// The configuration name of this provider.
    fn name(&self) -> &str;

    /// Asks the provider for one command suggestion given the redacted
    /// context and an optional explicit user intent.
    async fn suggest(&self, context: &str, query: Option<&str>) -> Result<String>;
}

/// Builds the client selected by `name` from the configuration.
pub fn create_provider(config: &Config, name: &str) -> Result<Box<dyn ProviderClient>> {
    let client = http_client()?;
    match name {
        "openai" => Ok(Box::new(OpenAiClient::openai(client, config)?)),
        "openai_compatible" => Ok(Box::new(OpenAiClient::openai_compatible(client, config)?)),
        "azure_openai" => Ok(Box::new(OpenAiClient::azure(client, config)?)),
        "deepseek" => Ok(Box::new(OpenAiClient::deepseek(client, config)?)),
        "anthropic" => Ok(Box::new(AnthropicClient::new(client, config)?)),
        "gemini" => Ok(Box::new(GeminiClient::new(client, config)?)),
        _ => Err(anyhow!("unsupported provider: {name}")),
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| anyhow!("failed to build HTTP client: {e}"))
}

/// The user-role message body shared by every provider.
pub(crate) fn build_user_prompt(context: &str, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{context}\nUser intent: {query}\nSuggested command:"),
        None => format!("{context}\nSuggested command:"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let config = Config::default_config();
        assert!(create_provider(&config, "clippy").is_err());
    }

    #[test]
    fn every_supported_provider_constructs_from_defaults() {
        let config = Config::default_config();
        for name in ["openai", "openai_compatible", "anthropic", "gemini", "deepseek"] {
            let client = create_provider(&config, name).unwrap();
            assert_eq!(client.name(), name);
        }
    }

    #[test]
    fn user_prompt_includes_the_query_when_present() {
        let prompt = build_user_prompt("ctx", Some("list files"));
        assert!(prompt.contains("ctx"));
        assert!(prompt.contains("list files"));
        let prompt = build_user_prompt("ctx", None);
        assert!(prompt.contains("ctx"));
        assert!(!prompt.contains("User intent"));
    }
}
