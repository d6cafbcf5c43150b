// smartsh/src/commands/suggest.rs
//! The `suggest` command: read back whatever the proxy has recorded,
//! redact it together with the shell history, ask the selected provider,
//! and publish the answer.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use smartsh_core::{ContextAssembler, Filter, SessionPaths};

use crate::cli::SuggestCommand;
use crate::config::Config;
use crate::providers;
use crate::session;

pub async fn run(cmd: SuggestCommand, config: &Config) -> Result<()> {
    let scope = cmd
        .scope
        .or_else(|| config.scope.clone())
        .unwrap_or_else(session::default_scope);
    let paths = SessionPaths::for_scope(&scope);

    let mut filter_config = config.privacy.clone();
    if let Some(level) = cmd.privacy_level {
        filter_config.level = level.into();
    }
    let assembler = ContextAssembler::new(Filter::new(filter_config), cmd.lines);

    let history = match &cmd.history_file {
        Some(path) => read_history(path)?,
        None => Vec::new(),
    };
    let session_dir = ContextAssembler::latest_session_dir(&paths.sessions_dir)?;
    if session_dir.is_none() {
        debug!("no recorded session found, suggesting from history alone");
    }
    let context = assembler.assemble(session_dir.as_deref(), &history)?;

    let provider_name = cmd
        .provider
        .unwrap_or_else(|| config.default_provider.clone());
    config.validate_provider_available(&provider_name)?;
    let client = providers::create_provider(config, &provider_name)?;

    info!("requesting suggestion from {provider_name}");
    let suggestion = client.suggest(&context, cmd.query.as_deref()).await?;
    let suggestion = suggestion.trim();

    // The shell-side widget polls this well-known file.
    fs::write(&paths.suggestion_path, suggestion).with_context(|| {
        format!(
            "failed to write suggestion to {}",
            paths.suggestion_path.display()
        )
    })?;
    println!("{suggestion}");
    Ok(())
}

/// Reads history lines from a file, or stdin when the path is `-`.
fn read_history(path: &Path) -> Result<Vec<String>> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read history from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read history file {}", path.display()))?
    };
    Ok(text.lines().map(str::to_string).collect())
}
