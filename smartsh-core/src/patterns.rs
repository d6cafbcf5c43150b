//! The built-in sensitive pattern catalogue and its compilation.
//!
//! Patterns are tabulated as `(name, minimum level, regex)` and
//! partitioned by [`FilterLevel`]; a filter applies exactly the patterns
//! whose minimum level does not exceed its configured level. Matching is
//! line-oriented and regex-based on purpose: shell text is structured
//! (assignments, flags, URLs) and syntactic shape is a strong, auditable
//! signal. False positives are an accepted trade-off for conservative
//! leakage prevention.
//!
//! License: MIT OR Apache-2.0

use log::warn;
use regex::Regex;

use crate::config::{FilterConfig, FilterLevel};
use crate::errors::SmartshError;

/// A single compiled redaction pattern, ready for application.
#[derive(Debug)]
pub struct SensitivePattern {
    /// Unique identifier for the pattern (e.g., "aws_access_key").
    pub name: String,
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// The string every match is replaced with.
    pub replacement: String,
    /// The lowest filter level at which this pattern applies.
    pub min_level: FilterLevel,
}

struct BuiltinPattern {
    name: &'static str,
    min_level: FilterLevel,
    pattern: &'static str,
}

const fn basic(name: &'static str, pattern: &'static str) -> BuiltinPattern {
    BuiltinPattern {
        name,
        min_level: FilterLevel::Basic,
        pattern,
    }
}

const fn moderate(name: &'static str, pattern: &'static str) -> BuiltinPattern {
    BuiltinPattern {
        name,
        min_level: FilterLevel::Moderate,
        pattern,
    }
}

const fn strict(name: &'static str, pattern: &'static str) -> BuiltinPattern {
    BuiltinPattern {
        name,
        min_level: FilterLevel::Strict,
        pattern,
    }
}

/// The full built-in catalogue, ordered by level and then by declaration.
///
/// Application order matters: patterns run sequentially over the
/// progressively filtered string, so an earlier, more specific pattern
/// can consume a token before a later, broader one sees it.
const BUILTIN_PATTERNS: &[BuiltinPattern] = &[
    // Provider API key shapes.
    basic("openai_api_key", r"sk-[a-zA-Z0-9]{48,}"),
    basic("openai_project_key", r"pk-[a-zA-Z0-9]{48,}"),
    // Generic key/token assignments and auth headers.
    basic(
        "generic_api_key",
        r#"(?i)api[_-]?key['"=:\s]+['"]*([a-zA-Z0-9_\-]{8,})['"]*"#,
    ),
    basic("bearer_token", r"(?i)bearer\s+([a-zA-Z0-9_\-\.]{2,})"),
    basic(
        "authorization_header",
        r#"(?i)authorization['"=:\s]+['"]*([a-zA-Z0-9_\-\.]{2,})['"]*"#,
    ),
    // Environment variable exports containing secrets.
    basic(
        "export_secret_env",
        r#"(?i)export\s+[A-Z_]*(?:API|KEY|TOKEN|SECRET|PASSWORD)[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "set_secret_env",
        r#"(?i)set\s+[A-Z_]*(?:API|KEY|TOKEN|SECRET|PASSWORD)[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    // Broader assignment shapes keyed on the variable name.
    basic(
        "env_var_key",
        r#"(?i)(?:export\s+|set\s+)?[A-Z_]*KEY[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "env_var_token",
        r#"(?i)(?:export\s+|set\s+)?[A-Z_]*TOKEN[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "env_var_secret",
        r#"(?i)(?:export\s+|set\s+)?[A-Z_]*SECRET[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "env_var_password",
        r#"(?i)(?:export\s+|set\s+)?[A-Z_]*PASSWORD[A-Z_]*=['"]*([^'"\s]{8,})['"]*"#,
    ),
    // Commands that echo a secret-bearing variable.
    basic(
        "echo_secret_env",
        r"(?i)echo\s+\$[A-Z_]*(?:API|KEY|TOKEN|SECRET|PASSWORD)[A-Z_]*",
    ),
    basic(
        "echo_env_var",
        r"(?i)echo\s+\$[A-Z_]*(?:KEY|TOKEN|SECRET|PASSWORD)[A-Z_]*",
    ),
    basic(
        "command_substitution_secret",
        r"(?i)\$\([^)]*(?:API|KEY|TOKEN|SECRET|PASSWORD)[^)]*\)",
    ),
    // A bare line consisting solely of a long opaque token. This exists
    // to catch command *output* that reveals a previously-exported
    // secret, at the known cost of false positives on hashes and build
    // artifacts printed to the terminal.
    basic("standalone_secret", r"(?m)^[a-zA-Z0-9_\-\.+/=]{20,}$"),
    basic(
        "revealed_secret_line",
        r"(?i)(?:^|\s)(?:sk-[a-zA-Z0-9]{48,}|pk-[a-zA-Z0-9]{48,}|ghp_[a-zA-Z0-9]{36}|ghs_[a-zA-Z0-9]{36}|AKIA[0-9A-Z]{16}|xox[baprs]-[0-9a-zA-Z\-]{10,72})(?:\s|$)",
    ),
    // Well-known provider environment variables.
    basic(
        "openai_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?OPENAI_API_KEY=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "anthropic_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?ANTHROPIC_API_KEY=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "google_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?(?:GOOGLE_API_KEY|GEMINI_API_KEY)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "aws_keys_env",
        r#"(?i)(?:export\s+|set\s+)?(?:AWS_ACCESS_KEY_ID|AWS_SECRET_ACCESS_KEY)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "github_token_env",
        r#"(?i)(?:export\s+|set\s+)?(?:GITHUB_TOKEN|GH_TOKEN)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "azure_keys_env",
        r#"(?i)(?:export\s+|set\s+)?(?:AZURE_CLIENT_SECRET|AZURE_TENANT_ID)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "slack_token_env",
        r#"(?i)(?:export\s+|set\s+)?(?:SLACK_TOKEN|SLACK_BOT_TOKEN)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "deepseek_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?DEEPSEEK_API_KEY=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "stripe_keys_env",
        r#"(?i)(?:export\s+|set\s+)?(?:STRIPE_SECRET_KEY|STRIPE_PUBLISHABLE_KEY)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "twilio_keys_env",
        r#"(?i)(?:export\s+|set\s+)?(?:TWILIO_AUTH_TOKEN|TWILIO_ACCOUNT_SID)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "sendgrid_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?SENDGRID_API_KEY=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "mailgun_api_key_env",
        r#"(?i)(?:export\s+|set\s+)?MAILGUN_API_KEY=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "redis_url_env",
        r#"(?i)(?:export\s+|set\s+)?REDIS_URL=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "mongodb_uri_env",
        r#"(?i)(?:export\s+|set\s+)?(?:MONGODB_URI|MONGO_URL)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "database_url_env",
        r#"(?i)(?:export\s+|set\s+)?(?:DATABASE_URL|DB_URL)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "jwt_secret_env",
        r#"(?i)(?:export\s+|set\s+)?(?:JWT_SECRET|JWT_KEY)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "encryption_key_env",
        r#"(?i)(?:export\s+|set\s+)?(?:ENCRYPTION_KEY|SECRET_KEY|SESSION_SECRET)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "docker_registry_env",
        r#"(?i)(?:export\s+|set\s+)?(?:DOCKER_PASSWORD|REGISTRY_TOKEN)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "ci_token_env",
        r#"(?i)(?:export\s+|set\s+)?(?:CI_TOKEN|GITLAB_TOKEN|JENKINS_TOKEN)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "cloud_provider_token_env",
        r#"(?i)(?:export\s+|set\s+)?(?:DIGITALOCEAN_TOKEN|VULTR_API_KEY|LINODE_TOKEN)=['"]*([^'"\s]{8,})['"]*"#,
    ),
    // JWT three-segment dot-delimited tokens.
    basic(
        "jwt_token",
        r"eyJ[a-zA-Z0-9_\-]*\.eyJ[a-zA-Z0-9_\-]*\.[a-zA-Z0-9_\-]*",
    ),
    // Credentials passed as command-line flags.
    basic(
        "password_flag",
        r#"(?i)--password[=\s]+['"]*([^'"\s]{4,})['"]*"#,
    ),
    basic("token_flag", r#"(?i)--token[=\s]+['"]*([^'"\s]{8,})['"]*"#),
    basic("secret_flag", r#"(?i)--secret[=\s]+['"]*([^'"\s]{8,})['"]*"#),
    // Database connection URLs carrying userinfo credentials.
    basic(
        "database_url",
        r"(?i)(mysql|postgresql|mongodb|redis)://[^@]+:[^@]+@[^\s]+",
    ),
    // Secrets embedded in curl/wget header arguments.
    basic(
        "curl_header_secret",
        r#"(?i)curl[^|]*-H['"]*[^'"]*(?:authorization|api[_-]?key|token)['"]*[=:]['"]*([^'"\s]{8,})['"]*"#,
    ),
    basic(
        "wget_header_secret",
        r#"(?i)wget[^|]*--header[='"]*[^'"]*(?:authorization|api[_-]?key|token)['"]*[=:]['"]*([^'"\s]{8,})['"]*"#,
    ),
    // Moderate tier: identities and vendor-specific token shapes.
    moderate(
        "email_in_auth",
        r#"(?i)(?:user|username|email|login)['"=:\s]+['"]*([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})['"]*"#,
    ),
    moderate(
        "email_in_curl_auth",
        r"(?i)curl\s+[^|]*-u\s+([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}):([^@\s]+)",
    ),
    moderate(
        "private_ipv4",
        r"(?:192\.168\.|10\.|172\.(?:1[6-9]|2[0-9]|3[01])\.)\d{1,3}\.\d{1,3}(?::\d+)?",
    ),
    moderate(
        "ssh_private_key",
        r"-----BEGIN (?:RSA |EC |OPENSSH )?PRIVATE KEY-----",
    ),
    moderate("aws_access_key", r"AKIA[0-9A-Z]{16}"),
    moderate(
        "aws_secret_key",
        r#"(?i)aws[_-]?secret[_-]?access[_-]?key['"=:\s]+['"]*([a-zA-Z0-9/+]{40})['"]*"#,
    ),
    moderate("github_token", r"ghp_[a-zA-Z0-9]{36}"),
    moderate("github_app_token", r"ghs_[a-zA-Z0-9]{36}"),
    moderate("github_oauth_token", r"gho_[a-zA-Z0-9]{36}"),
    moderate("slack_token", r"xox[baprs]-[0-9a-zA-Z-]{10,72}"),
    moderate("url_userinfo_password", r"(?i)://[^:@]+:([^@\s]{4,})@"),
    // Strict tier: aggressive catch-alls.
    strict("long_opaque_token", r"\b[a-zA-Z0-9]{32,}\b"),
    strict(
        "payment_card",
        r"\b(?:4\d{3}|5[1-5]\d{2}|6011|65\d{2})\s*\d{4}\s*\d{4}\s*\d{4}\b",
    ),
    strict("us_ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    strict(
        "labeled_phone",
        r#"(?i)(?:phone|tel|mobile)['"=:\s]+['"]*([+]?[\d\s\-\(\)]{10,})['"]*"#,
    ),
];

/// Checks that every custom pattern compiles, reporting the first
/// failure. Used by configuration validation; the filter itself skips
/// bad patterns at runtime instead of failing.
pub fn validate_custom_patterns(patterns: &[String]) -> Result<(), SmartshError> {
    for (index, pattern) in patterns.iter().enumerate() {
        if let Err(e) = Regex::new(pattern) {
            return Err(SmartshError::PatternCompile(
                format!("custom_pattern_{}", index + 1),
                e,
            ));
        }
    }
    Ok(())
}

/// Compiles the patterns applicable under `config`: built-ins whose
/// minimum level does not exceed the configured level, followed by all
/// custom patterns (treated as Basic for ordering).
///
/// A pattern that fails to compile is skipped with a warning; one
/// malformed custom pattern must never disable the rest of the pipeline.
pub(crate) fn compile_patterns(config: &FilterConfig) -> Vec<SensitivePattern> {
    let replacement = if config.replacement_text.is_empty() {
        crate::config::DEFAULT_REPLACEMENT
    } else {
        config.replacement_text.as_str()
    };

    let mut compiled = Vec::new();

    for builtin in BUILTIN_PATTERNS {
        if builtin.min_level > config.level {
            continue;
        }
        match Regex::new(builtin.pattern) {
            Ok(regex) => compiled.push(SensitivePattern {
                name: builtin.name.to_string(),
                regex,
                replacement: replacement.to_string(),
                min_level: builtin.min_level,
            }),
            Err(e) => warn!("skipping built-in pattern '{}': {e}", builtin.name),
        }
    }

    for (index, pattern) in config.custom_patterns.iter().enumerate() {
        match Regex::new(pattern) {
            Ok(regex) => compiled.push(SensitivePattern {
                name: format!("custom_pattern_{}", index + 1),
                regex,
                replacement: replacement.to_string(),
                min_level: FilterLevel::Basic,
            }),
            Err(e) => warn!("skipping malformed custom pattern {}: {e}", index + 1),
        }
    }

    compiled
}
