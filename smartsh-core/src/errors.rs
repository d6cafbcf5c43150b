//! errors.rs - Custom error types for the smartsh-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR Apache-2.0

use thiserror::Error;

/// All error types produced by the `smartsh-core` library and the
/// session layer built on top of it.
///
/// `#[non_exhaustive]` signals to consumers that new variants may be
/// added in future versions, so they cannot match exhaustively and break
/// on upgrades.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SmartshError {
    #[error("failed to compile redaction pattern '{0}': {1}")]
    PatternCompile(String, regex::Error),

    #[error("a recording session is already active (pid {0})")]
    SessionActive(u32),

    #[error("failed to allocate a pseudo-terminal: {0}")]
    PtyOpen(String),

    #[error("failed to spawn the shell process: {0}")]
    ShellSpawn(String),

    #[error("an unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("a critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),

    #[error("a fatal error occurred: {0}")]
    Fatal(String),
}
