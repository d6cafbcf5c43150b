// smartsh/tests/config_tests.rs
use smartsh::config::{AzureOpenAiConfig, Config, ProviderConfig};
use smartsh_core::{FilterLevel, RotationConfig};
use tempfile::tempdir;

#[test]
fn default_config_has_the_stock_providers() {
    let config = Config::default_config();
    assert_eq!(config.default_provider, "openai");
    assert_eq!(config.openai.as_ref().unwrap().model, "gpt-4o-mini");
    assert_eq!(
        config.openai.as_ref().unwrap().base_url,
        "https://api.openai.com"
    );
    assert_eq!(
        config.anthropic.as_ref().unwrap().base_url,
        "https://api.anthropic.com"
    );
    assert_eq!(config.deepseek.as_ref().unwrap().model, "deepseek-chat");
    assert_eq!(
        config.azure_openai.as_ref().unwrap().provider.api_version,
        "2024-10-21"
    );
    assert_eq!(config.privacy.level, FilterLevel::Basic);
    assert!(config.privacy.enabled);
}

#[test]
fn default_config_validates_cleanly() {
    assert!(Config::default_config().validate().is_ok());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::default_config();
    config.default_provider = "anthropic".to_string();
    if let Some(anthropic) = &mut config.anthropic {
        anthropic.api_key = "test-key-123".to_string();
    }
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.default_provider, "anthropic");
    assert_eq!(loaded.anthropic.as_ref().unwrap().api_key, "test-key-123");
    assert_eq!(
        loaded.anthropic.as_ref().unwrap().base_url,
        "https://api.anthropic.com"
    );
}

#[cfg(unix)]
#[test]
fn saved_config_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");
    Config::default_config().save(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    let dir_mode = std::fs::metadata(path.parent().unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(dir_mode & 0o777, 0o700);
}

#[test]
fn load_merges_missing_fields_from_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "openai": { "api_key": "sk-test" }, "default_provider": "openai" }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let openai = config.openai.as_ref().unwrap();
    assert_eq!(openai.api_key, "sk-test");
    // Missing fields come from the defaults.
    assert_eq!(openai.base_url, "https://api.openai.com");
    assert_eq!(openai.model, "gpt-4o-mini");
    // Sections the user never mentioned are filled in whole.
    assert!(config.gemini.is_some());
}

#[test]
fn load_rejects_a_missing_file() {
    let dir = tempdir().unwrap();
    assert!(Config::load(&dir.path().join("nope.json")).is_err());
}

#[test]
fn load_or_default_accepts_a_missing_file() {
    let dir = tempdir().unwrap();
    let config = Config::load_or_default(&dir.path().join("nope.json")).unwrap();
    assert_eq!(config.default_provider, "openai");
}

#[test]
fn invalid_default_provider_is_reported() {
    let mut config = Config::default_config();
    config.default_provider = "skynet".to_string();
    let errors = config.validate().unwrap_err();
    assert!(errors.to_string().contains("default_provider"));
    assert!(errors.to_string().contains("skynet"));
}

#[test]
fn model_prefix_problems_are_reported() {
    let mut config = Config::default_config();
    if let Some(anthropic) = &mut config.anthropic {
        anthropic.model = "gpt-4o".to_string();
    }
    let errors = config.validate().unwrap_err();
    assert!(errors.to_string().contains("anthropic.model"));
}

#[test]
fn azure_exclusive_routing_fields_are_reported() {
    let mut config = Config::default_config();
    config.azure_openai = Some(AzureOpenAiConfig {
        provider: ProviderConfig {
            api_key: "key".to_string(),
            base_url: "https://example.openai.azure.com".to_string(),
            api_version: "2024-10-21".to_string(),
            ..Default::default()
        },
        resource_name: "example".to_string(),
        deployment_name: "gpt4".to_string(),
    });
    let errors = config.validate().unwrap_err();
    assert!(errors.to_string().contains("resource_name"));
}

#[test]
fn azure_requires_a_deployment_with_a_key() {
    let mut config = Config::default_config();
    config.azure_openai = Some(AzureOpenAiConfig {
        provider: ProviderConfig {
            api_key: "key".to_string(),
            api_version: "2024-10-21".to_string(),
            ..Default::default()
        },
        ..Default::default()
    });
    let errors = config.validate().unwrap_err();
    assert!(errors.to_string().contains("deployment_name"));
}

#[test_log::test]
fn malformed_custom_pattern_is_reported() {
    let mut config = Config::default_config();
    config.privacy.custom_patterns = vec!["[unclosed".to_string()];
    let errors = config.validate().unwrap_err();
    assert!(errors.to_string().contains("privacy.custom_patterns"));
}

#[test]
fn multiple_problems_are_aggregated() {
    let mut config = Config::default_config();
    config.default_provider = "skynet".to_string();
    config.rotation = RotationConfig {
        max_segment_bytes: 0,
        ..Default::default()
    };
    let errors = config.validate().unwrap_err();
    let report = errors.to_string();
    assert!(report.contains("multiple validation errors"));
    assert!(report.contains("default_provider"));
    assert!(report.contains("rotation.max_segment_bytes"));
}

#[test]
fn api_key_comes_from_the_config_only() {
    let mut config = Config::default_config();
    assert!(config.api_key("openai").is_err());
    if let Some(openai) = &mut config.openai {
        openai.api_key = "sk-test".to_string();
    }
    assert_eq!(config.api_key("openai").unwrap(), "sk-test");
    assert!(config.api_key("skynet").is_err());
}

#[test]
fn provider_availability_checks_keys_and_azure_deployment() {
    let mut config = Config::default_config();
    assert!(config.validate_provider_available("openai").is_err());

    if let Some(openai) = &mut config.openai {
        openai.api_key = "sk-test".to_string();
    }
    assert!(config.validate_provider_available("openai").is_ok());

    // A local OpenAI-compatible server needs no key.
    assert!(config.validate_provider_available("openai_compatible").is_ok());

    assert!(config.validate_provider_available("skynet").is_err());
}

#[test]
fn redacted_view_masks_every_key() {
    let mut config = Config::default_config();
    if let Some(openai) = &mut config.openai {
        openai.api_key = "sk-super-secret".to_string();
    }
    if let Some(azure) = &mut config.azure_openai {
        azure.provider.api_key = "azure-secret".to_string();
    }
    let rendered = serde_json::to_string(&config.redacted()).unwrap();
    assert!(!rendered.contains("sk-super-secret"));
    assert!(!rendered.contains("azure-secret"));
    assert!(rendered.contains("[REDACTED]"));
}

#[test]
fn privacy_section_round_trips_through_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "privacy": {
                "level": "strict",
                "enabled": true,
                "custom_patterns": ["internal-[0-9]+"],
                "replacement_text": "(gone)"
            },
            "rotation": { "max_segment_bytes": 2048, "max_segments": 3, "max_age_secs": 60 }
        }"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.privacy.level, FilterLevel::Strict);
    assert_eq!(config.privacy.replacement_text, "(gone)");
    assert_eq!(config.privacy.custom_patterns, vec!["internal-[0-9]+"]);
    assert_eq!(config.rotation.max_segment_bytes, 2048);
    assert_eq!(config.rotation.max_segments, 3);
    assert_eq!(config.rotation.max_age_secs, 60);
}
