// smartsh/src/main.rs
//! Smartsh entry point.
//!
//! Resolves the configuration, bootstraps diagnostic logging, and
//! dispatches to the requested command.

use anyhow::Result;
use clap::Parser;
use smartsh::cli::{Cli, Commands};
use smartsh::commands;
use smartsh::config::Config;
use smartsh::logger;
use smartsh::session;
use smartsh_core::SessionPaths;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    match args.command {
        // Config management must keep working even when the current
        // file is broken, so it never loads it up front.
        Commands::Config(cmd) => {
            init_diagnostics(args.debug, None);
            commands::config_cmd::run(cmd, &config_path)
        }
        Commands::Proxy(cmd) => {
            let config = Config::load_or_default(&config_path)?;
            init_diagnostics(args.debug, Some(&config));
            commands::proxy::run(cmd, &config, args.quiet).await
        }
        Commands::Suggest(cmd) => {
            let config = Config::load_or_default(&config_path)?;
            init_diagnostics(args.debug, Some(&config));
            commands::suggest::run(cmd, &config).await
        }
    }
}

fn init_diagnostics(debug: bool, config: Option<&Config>) {
    let scope = config
        .and_then(|config| config.scope.clone())
        .unwrap_or_else(session::default_scope);
    let paths = SessionPaths::for_scope(&scope);
    logger::init_logger(debug, &paths.diagnostic_log_path);
}
