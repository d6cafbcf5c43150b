// smartsh/src/commands/config_cmd.rs
//! The `config` subcommands: init, show, path.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::warn;

use crate::cli::ConfigCommand;
use crate::config::Config;

pub fn run(cmd: ConfigCommand, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Init { force } => init(path, force),
        ConfigCommand::Show => show(path),
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    let config = Config::default_config();
    config.save(path)?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}

fn show(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    if let Err(e) = config.validate() {
        warn!("configuration has problems: {e}");
        eprintln!("warning: {e}");
    }
    let rendered = serde_json::to_string_pretty(&config.redacted())
        .context("failed to render configuration")?;
    println!("{rendered}");
    Ok(())
}
