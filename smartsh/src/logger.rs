// smartsh/src/logger.rs
//! Diagnostic logging bootstrap.
//!
//! Recording and redaction failures must never surface into the user's
//! terminal; that would break the transparency the proxy exists to
//! provide. So logging is off by default, and with `--debug` every
//! `log` line is appended to the shared diagnostic log file instead of
//! stderr. The log is advisory only; nothing consults it for
//! correctness.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Target};
use log::LevelFilter;

/// Initializes the global logger.
///
/// With `debug` set, lines go to the append-only diagnostic log at
/// `diagnostic_log_path`; if that file cannot be opened, logging stays
/// off rather than spilling into the terminal.
pub fn init_logger(debug: bool, diagnostic_log_path: &Path) {
    if !debug {
        Builder::new().filter_level(LevelFilter::Off).init();
        return;
    }

    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(diagnostic_log_path)
    {
        Ok(file) => {
            Builder::new()
                .filter_level(LevelFilter::Debug)
                .target(Target::Pipe(Box::new(file)))
                .init();
            log::debug!("diagnostic logging enabled (pid {})", std::process::id());
        }
        Err(_) => {
            Builder::new().filter_level(LevelFilter::Off).init();
        }
    }
}
