// smartsh/src/cli.rs
//! This file defines the command-line interface (CLI) for the smartsh
//! application, including all available commands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use smartsh_core::FilterLevel;
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "smartsh",
    version = env!("CARGO_PKG_VERSION"),
    about = "AI command suggestions for your shell, recorded transparently and redacted always",
    long_about = "Smartsh augments an interactive shell with AI-generated command suggestions. \
A background proxy session records the terminal into rotating, size-bounded log files, and a \
multi-level privacy filter scrubs credentials and secrets from that capture (and from the \
shell history) before any of it is used as model context.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Enable debug logging to the shared diagnostic log file.
    #[arg(long, short = 'd', help = "Enable debug logging to the diagnostic log file.")]
    pub debug: bool,

    /// Disable informational messages on stderr.
    #[arg(long, short = 'q', help = "Suppress all informational messages.")]
    pub quiet: bool,

    /// Path to the provider configuration file.
    #[arg(
        long = "config",
        value_name = "FILE",
        env = "SMARTSH_PROVIDER_FILE",
        help = "Path to the provider configuration file (JSON)."
    )]
    pub config: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `smartsh` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Starts the recording proxy around an interactive shell.
    #[command(about = "Start the recording proxy around an interactive shell.")]
    Proxy(ProxyCommand),

    /// Produces one AI command suggestion from the recorded context.
    #[command(about = "Produce one AI command suggestion from the recorded, redacted context.")]
    Suggest(SuggestCommand),

    /// Inspects and manages the provider configuration file.
    #[command(subcommand, about = "Inspect and manage the provider configuration file.")]
    Config(ConfigCommand),
}

/// Arguments for the `proxy` command.
#[derive(Parser, Debug)]
pub struct ProxyCommand {
    /// Shell to spawn inside the proxy (defaults to $SHELL).
    #[arg(long, value_name = "SHELL", help = "Shell to spawn inside the proxy (defaults to $SHELL).")]
    pub shell: Option<String>,

    /// Lock scope under which at most one proxy session may run.
    #[arg(long, value_name = "NAME", help = "Lock scope name (defaults to the host name).")]
    pub scope: Option<String>,

    /// Override the maximum size of a capture log segment.
    #[arg(long = "max-segment-bytes", value_name = "BYTES", help = "Maximum size of a capture log segment.")]
    pub max_segment_bytes: Option<u64>,

    /// Override how many sealed segments are retained.
    #[arg(long = "max-segments", value_name = "COUNT", help = "Maximum number of sealed segments retained.")]
    pub max_segments: Option<usize>,

    /// Override the maximum sealed segment age, in seconds.
    #[arg(long = "max-age-secs", value_name = "SECS", help = "Maximum age of a retained sealed segment, in seconds.")]
    pub max_age_secs: Option<u64>,
}

/// Arguments for the `suggest` command.
#[derive(Parser, Debug)]
pub struct SuggestCommand {
    /// Provider to ask (defaults to the configured default_provider).
    #[arg(long, short = 'p', value_name = "NAME", help = "Provider to ask (defaults to the configured default_provider).")]
    pub provider: Option<String>,

    /// File holding recent shell history lines; '-' reads stdin.
    #[arg(long = "history-file", value_name = "FILE", help = "File holding recent shell history lines ('-' reads stdin).")]
    pub history_file: Option<PathBuf>,

    /// Optional user intent to steer the suggestion.
    #[arg(long, value_name = "TEXT", help = "Optional user intent to steer the suggestion.")]
    pub query: Option<String>,

    /// Captured terminal lines to include as context.
    #[arg(long, value_name = "COUNT", default_value_t = 50, help = "Maximum captured lines of terminal output to include.")]
    pub lines: usize,

    /// Override the configured privacy filter level.
    #[arg(long = "privacy-level", value_enum, value_name = "LEVEL", help = "Override the configured privacy filter level.")]
    pub privacy_level: Option<LevelChoice>,

    /// Lock scope whose capture to read.
    #[arg(long, value_name = "NAME", help = "Lock scope name (defaults to the host name).")]
    pub scope: Option<String>,
}

/// Privacy filter levels selectable from the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelChoice {
    /// No filtering at all
    None,
    /// Common API key, token, and credential shapes
    Basic,
    /// Basic plus emails, private IPs, and vendor tokens
    Moderate,
    /// Moderate plus aggressive long-token matching
    Strict,
}

impl From<LevelChoice> for FilterLevel {
    fn from(choice: LevelChoice) -> Self {
        match choice {
            LevelChoice::None => FilterLevel::None,
            LevelChoice::Basic => FilterLevel::Basic,
            LevelChoice::Moderate => FilterLevel::Moderate,
            LevelChoice::Strict => FilterLevel::Strict,
        }
    }
}

/// Subcommands for `smartsh config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Writes a default configuration file.
    #[command(about = "Write a default configuration file.")]
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long, short = 'f', help = "Overwrite an existing configuration file.")]
        force: bool,
    },

    /// Prints the effective configuration with API keys masked.
    #[command(about = "Print the effective configuration with API keys masked.")]
    Show,

    /// Prints the configuration file path.
    #[command(about = "Print the configuration file path.")]
    Path,
}
