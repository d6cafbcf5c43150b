// smartsh/src/config.rs
//! Provider configuration file handling.
//!
//! The configuration is a JSON file (by default
//! `~/.config/smartsh/config.json`) holding per-provider credentials and
//! endpoints, the privacy filter settings, and the capture rotation
//! parameters. Missing fields are merged from defaults on load, and the
//! file is written with owner-only permissions since it carries API keys.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use smartsh_core::{validate_custom_patterns, FilterConfig, RotationConfig};
use url::Url;

/// Providers accepted in `default_provider` and on the command line.
pub const SUPPORTED_PROVIDERS: &[&str] = &[
    "openai",
    "openai_compatible",
    "azure_openai",
    "anthropic",
    "gemini",
    "deepseek",
];

/// Configuration for a single AI provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub base_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_version: String,
}

/// Azure OpenAI carries two extra routing fields on top of the common
/// provider settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureOpenAiConfig {
    #[serde(flatten)]
    pub provider: ProviderConfig,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub deployment_name: String,
}

/// The complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_compatible: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure_openai: Option<AzureOpenAiConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini: Option<ProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepseek: Option<ProviderConfig>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub default_provider: String,

    /// Privacy filter applied to capture and history before any of it
    /// becomes model context.
    pub privacy: FilterConfig,
    /// Capture log rotation parameters.
    pub rotation: RotationConfig,
    /// Lock scope override; defaults to the host name when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Config {
    /// A configuration with the stock provider endpoints and models.
    pub fn default_config() -> Self {
        Self {
            default_provider: "openai".to_string(),
            openai: Some(ProviderConfig {
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                ..Default::default()
            }),
            openai_compatible: Some(ProviderConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.2:latest".to_string(),
                ..Default::default()
            }),
            azure_openai: Some(AzureOpenAiConfig {
                provider: ProviderConfig {
                    api_version: "2024-10-21".to_string(),
                    ..Default::default()
                },
                ..Default::default()
            }),
            anthropic: Some(ProviderConfig {
                base_url: "https://api.anthropic.com".to_string(),
                model: "claude-3-5-sonnet-20241022".to_string(),
                ..Default::default()
            }),
            gemini: Some(ProviderConfig {
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.5-flash".to_string(),
                ..Default::default()
            }),
            deepseek: Some(ProviderConfig {
                base_url: "https://api.deepseek.com".to_string(),
                model: "deepseek-chat".to_string(),
                ..Default::default()
            }),
            privacy: FilterConfig::default(),
            rotation: RotationConfig::default(),
            scope: None,
        }
    }

    /// The default configuration file path (`~/.config/smartsh/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("failed to get user home directory"))?;
        Ok(home.join(".config").join("smartsh").join("config.json"))
    }

    /// Loads the configuration from `path`, merging missing fields from
    /// defaults. Errors when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("config file not found: {}", path.display()));
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.merge_defaults();
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads the configuration, falling back to defaults when the file
    /// does not exist. The proxy side works without any config file;
    /// only the suggestion side needs provider credentials.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(
                "no config file at {}, using built-in defaults",
                path.display()
            );
            Ok(Self::default_config())
        }
    }

    /// Saves the configuration with restricted permissions (0700
    /// directory, 0600 file) since it carries API keys.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config directory {}", dir.display()))?;
            set_secure_dir_permissions(dir)?;
        }
        let data = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, data)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        set_secure_file_permissions(path)?;
        info!("wrote configuration to {}", path.display());
        Ok(())
    }

    /// Fills in any provider field the user left out from the defaults.
    fn merge_defaults(&mut self) {
        let defaults = Self::default_config();

        if self.default_provider.is_empty() {
            self.default_provider = defaults.default_provider;
        }

        merge_provider(&mut self.openai, defaults.openai);
        merge_provider(&mut self.openai_compatible, defaults.openai_compatible);
        merge_provider(&mut self.anthropic, defaults.anthropic);
        merge_provider(&mut self.gemini, defaults.gemini);
        merge_provider(&mut self.deepseek, defaults.deepseek);

        if let Some(azure) = &mut self.azure_openai {
            if let Some(default) = defaults.azure_openai {
                merge_provider_fields(&mut azure.provider, &default.provider);
            }
        } else {
            self.azure_openai = defaults.azure_openai;
        }
    }

    /// Returns the provider section for `name`.
    pub fn provider(&self, name: &str) -> Result<&ProviderConfig> {
        let section = match name {
            "openai" => self.openai.as_ref(),
            "openai_compatible" => self.openai_compatible.as_ref(),
            "azure_openai" => self.azure_openai.as_ref().map(|a| &a.provider),
            "anthropic" => self.anthropic.as_ref(),
            "gemini" => self.gemini.as_ref(),
            "deepseek" => self.deepseek.as_ref(),
            _ => return Err(anyhow!("unsupported provider: {name}")),
        };
        section.ok_or_else(|| anyhow!("{name} configuration not found"))
    }

    /// The API key for `name`, from the config file only (no environment
    /// fallback: keys live in one owner-readable place).
    pub fn api_key(&self, name: &str) -> Result<String> {
        let key = self.provider(name)?.api_key.clone();
        if key.is_empty() {
            return Err(anyhow!("{name} API key not found in config file"));
        }
        Ok(key)
    }

    /// Checks that `name` is configured well enough to serve a request.
    pub fn validate_provider_available(&self, name: &str) -> Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&name) {
            return Err(anyhow!("unsupported provider: {name}"));
        }
        let provider = self.provider(name)?;
        if provider.api_key.is_empty() && name != "openai_compatible" {
            return Err(anyhow!("{name} API key not configured"));
        }
        if name == "azure_openai" {
            let azure = self
                .azure_openai
                .as_ref()
                .ok_or_else(|| anyhow!("azure_openai configuration not found"))?;
            if azure.deployment_name.is_empty() {
                return Err(anyhow!("azure_openai deployment name not configured"));
            }
        }
        Ok(())
    }

    /// Validates the whole configuration, aggregating every problem into
    /// one report instead of stopping at the first.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if !self.default_provider.is_empty()
            && !SUPPORTED_PROVIDERS.contains(&self.default_provider.as_str())
        {
            errors.push(ValidationError {
                field: "default_provider".to_string(),
                message: format!(
                    "invalid provider '{}', must be one of: {}",
                    self.default_provider,
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            });
        }

        if let Some(provider) = &self.openai {
            validate_provider_config("openai", provider, &mut errors);
        }
        if let Some(provider) = &self.openai_compatible {
            validate_provider_config("openai_compatible", provider, &mut errors);
        }
        if let Some(azure) = &self.azure_openai {
            validate_azure_config(azure, &mut errors);
        }
        if let Some(provider) = &self.anthropic {
            validate_provider_config("anthropic", provider, &mut errors);
        }
        if let Some(provider) = &self.gemini {
            validate_provider_config("gemini", provider, &mut errors);
        }
        if let Some(provider) = &self.deepseek {
            validate_provider_config("deepseek", provider, &mut errors);
        }

        if let Err(e) = validate_custom_patterns(&self.privacy.custom_patterns) {
            errors.push(ValidationError {
                field: "privacy.custom_patterns".to_string(),
                message: e.to_string(),
            });
        }

        if self.rotation.max_segment_bytes == 0 {
            errors.push(ValidationError {
                field: "rotation.max_segment_bytes".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// A copy of the configuration with every API key masked, for
    /// display purposes.
    pub fn redacted(&self) -> Self {
        let mut masked = self.clone();
        for provider in [
            &mut masked.openai,
            &mut masked.openai_compatible,
            &mut masked.anthropic,
            &mut masked.gemini,
            &mut masked.deepseek,
        ]
        .into_iter()
        .flatten()
        {
            mask_key(&mut provider.api_key);
        }
        if let Some(azure) = &mut masked.azure_openai {
            mask_key(&mut azure.provider.api_key);
        }
        masked
    }
}

fn mask_key(key: &mut String) {
    if !key.is_empty() {
        *key = "[REDACTED]".to_string();
    }
}

fn merge_provider(section: &mut Option<ProviderConfig>, default: Option<ProviderConfig>) {
    if let Some(provider) = section {
        if let Some(default) = default {
            merge_provider_fields(provider, &default);
        }
    } else {
        *section = default;
    }
}

fn merge_provider_fields(provider: &mut ProviderConfig, default: &ProviderConfig) {
    if provider.base_url.is_empty() {
        provider.base_url = default.base_url.clone();
    }
    if provider.model.is_empty() {
        provider.model = default.model.clone();
    }
    if provider.api_version.is_empty() {
        provider.api_version = default.api_version.clone();
    }
}

/// A single configuration validation problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation error in {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Every validation problem found in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.len() {
            0 => write!(f, "no validation errors"),
            1 => write!(f, "{}", self.0[0]),
            _ => {
                let joined: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
                write!(f, "multiple validation errors: {}", joined.join("; "))
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

fn validate_provider_config(name: &str, provider: &ProviderConfig, errors: &mut Vec<ValidationError>) {
    if !provider.base_url.is_empty() {
        if let Err(message) = validate_url(&provider.base_url) {
            errors.push(ValidationError {
                field: format!("{name}.base_url"),
                message,
            });
        } else if name == "openai_compatible" && has_version_prefix(&provider.base_url) {
            errors.push(ValidationError {
                field: format!("{name}.base_url"),
                message: format!(
                    "base URL '{}' ends with a version prefix; use either the bare host or the full chat/completions path",
                    provider.base_url
                ),
            });
        }
    }

    if !provider.model.is_empty() {
        if let Err(message) = validate_model_name(name, &provider.model) {
            errors.push(ValidationError {
                field: format!("{name}.model"),
                message,
            });
        }
    }
}

fn validate_azure_config(azure: &AzureOpenAiConfig, errors: &mut Vec<ValidationError>) {
    validate_provider_config("azure_openai", &azure.provider, errors);

    if !azure.resource_name.is_empty() && !azure.provider.base_url.is_empty() {
        errors.push(ValidationError {
            field: "azure_openai.resource_name".to_string(),
            message: "cannot specify both resource_name and base_url, use one or the other"
                .to_string(),
        });
    }

    if azure.deployment_name.is_empty() && !azure.provider.api_key.is_empty() {
        errors.push(ValidationError {
            field: "azure_openai.deployment_name".to_string(),
            message: "deployment_name is required when using Azure OpenAI".to_string(),
        });
    }

    if !azure.provider.api_version.is_empty() && !is_valid_api_version(&azure.provider.api_version)
    {
        errors.push(ValidationError {
            field: "azure_openai.api_version".to_string(),
            message: "invalid API version format, should be in format YYYY-MM-DD".to_string(),
        });
    }
}

fn validate_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| format!("invalid URL format: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err("URL scheme must be http or https".to_string()),
    }
    if parsed.host_str().is_none() {
        return Err("URL must include a host".to_string());
    }
    Ok(())
}

/// Whether the URL's last path segment is a bare API version like `/v1`
/// or `/v4/`. An OpenAI-compatible base URL should be either the bare
/// host (the client appends the path) or the full endpoint path, never
/// the version prefix alone.
pub(crate) fn has_version_prefix(url: &str) -> bool {
    let trimmed = url.trim_end_matches('/');
    let Some(last) = trimmed.rsplit('/').next() else {
        return false;
    };
    let Some(digits) = last.strip_prefix('v') else {
        return false;
    };
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn validate_model_name(provider: &str, model: &str) -> Result<(), String> {
    match provider {
        "openai" => {
            if !model.starts_with("gpt-") {
                return Err(format!(
                    "model '{model}' may not be valid for OpenAI (expected format: gpt-*)"
                ));
            }
        }
        "anthropic" => {
            if !model.starts_with("claude-") {
                return Err(format!(
                    "model '{model}' may not be valid for Anthropic (expected format: claude-*)"
                ));
            }
        }
        "gemini" => {
            if !model.starts_with("gemini-") && !model.starts_with("models/gemini-") {
                return Err(format!(
                    "model '{model}' may not be valid for Gemini (expected format: gemini-* or models/gemini-*)"
                ));
            }
        }
        "deepseek" => {
            if !model.starts_with("deepseek-") {
                return Err(format!(
                    "model '{model}' may not be valid for DeepSeek (expected format: deepseek-*)"
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

fn is_valid_api_version(version: &str) -> bool {
    // Basic shape check only: YYYY-MM-DD.
    let parts: Vec<&str> = version.split('-').collect();
    parts.len() == 3
        && parts[0].len() == 4
        && parts[1].len() == 2
        && parts[2].len() == 2
        && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(unix)]
fn set_secure_file_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(unix)]
fn set_secure_dir_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn set_secure_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_prefix_detection() {
        let cases = [
            ("https://open.bigmodel.cn/api/paas/v4/", true),
            ("https://open.bigmodel.cn/api/paas/v4", true),
            ("https://api.openai.com/v1", true),
            ("https://api.example.com/v2", true),
            ("https://api.example.com/v10", true),
            ("https://open.bigmodel.cn/api/paas/v4/chat/completions", false),
            ("https://api.example.com/chat/completions", false),
            ("https://api.example.com/valid", false),
            ("https://api.example.com/version", false),
            ("https://api.example.com/v-a", false),
            ("", false),
        ];
        for (url, expected) in cases {
            assert_eq!(
                has_version_prefix(url),
                expected,
                "has_version_prefix({url:?})"
            );
        }
    }

    #[test]
    fn compatible_base_url_with_version_prefix_is_rejected() {
        let cases = [
            ("https://api.example.com", false),
            ("https://open.bigmodel.cn/api/paas/v4/chat/completions", false),
            ("https://open.bigmodel.cn/api/paas/v4/", true),
            ("https://api.example.com/v1", true),
        ];
        for (base_url, expect_error) in cases {
            let provider = ProviderConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            };
            let mut errors = Vec::new();
            validate_provider_config("openai_compatible", &provider, &mut errors);
            if expect_error {
                assert!(
                    errors
                        .iter()
                        .any(|e| e.field == "openai_compatible.base_url"
                            && e.message.contains("version prefix")),
                    "expected a version-prefix error for {base_url}"
                );
            } else {
                assert!(errors.is_empty(), "unexpected errors for {base_url}: {errors:?}");
            }
        }
    }

    #[test]
    fn api_version_shape_check() {
        assert!(is_valid_api_version("2024-10-21"));
        assert!(!is_valid_api_version("2024-10"));
        assert!(!is_valid_api_version("24-10-21"));
        assert!(!is_valid_api_version("2024/10/21"));
        assert!(!is_valid_api_version("2024-1-21"));
    }

    #[test]
    fn url_validation_requires_http_scheme_and_host() {
        assert!(validate_url("https://api.openai.com").is_ok());
        assert!(validate_url("http://localhost:11434").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }
}
