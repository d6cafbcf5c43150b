// smartsh-core/src/lib.rs
//! # Smartsh Core Library
//!
//! `smartsh-core` provides the storage and privacy pipeline behind the
//! Smartsh shell assistant: bounded, compressed capture logs for a
//! recorded terminal session; a multi-level redaction filter that scrubs
//! credentials and secrets from shell text; and the assembler that turns
//! captured output plus shell history into one redacted context string.
//!
//! The capture side and the suggestion side never talk to each other
//! directly; they meet on the filesystem. The proxy session (in the
//! `smartsh` binary) appends raw pty bytes through a [`LogRotator`];
//! whenever a suggestion is requested, a [`ContextAssembler`] reads back
//! whatever has been written so far, pushes it through a [`Filter`], and
//! hands the result onward. Nothing in this crate talks to an AI
//! provider or parses command-line arguments.
//!
//! ## Modules
//!
//! * `config`: Filter, rotation, and filesystem-layout value structs.
//! * `patterns`: The built-in sensitive pattern catalogue, by level.
//! * `filter`: The redaction engine applying those patterns to text.
//! * `rotation`: Size-bounded segment files with compression/retention.
//! * `context`: Redacted suggestion-context assembly.
//! * `errors`: The structured [`SmartshError`] type.
//!
//! ## Usage Example
//!
//! ```rust
//! use smartsh_core::{Filter, FilterConfig, FilterLevel};
//!
//! let filter = Filter::new(FilterConfig {
//!     level: FilterLevel::Basic,
//!     ..Default::default()
//! });
//!
//! let line = "export OPENAI_API_KEY=sk-1234567890abcdef1234567890abcdef1234567890abcdef12";
//! let redacted = filter.filter_text(line);
//! assert!(redacted.contains("[REDACTED]"));
//! assert!(!redacted.contains("sk-1234567890"));
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return `anyhow::Result` with context at the
//! boundaries; [`SmartshError`] carries the conditions callers branch on
//! (an already-active session, a failed pty spawn). Capture-path
//! operations that must never disturb the host shell, such as log
//! appends, compression, and retention deletes, log their failures
//! instead of returning them.
//!
//! License: MIT OR Apache-2.0

pub mod config;
pub mod context;
pub mod errors;
pub mod filter;
pub mod patterns;
pub mod rotation;

/// Re-exports the configuration value structs consumed at startup.
pub use config::{new_session_id, FilterConfig, FilterLevel, RotationConfig, SessionPaths};

/// Re-exports the redaction engine.
pub use filter::Filter;

/// Re-exports the compiled pattern type and the configuration-time
/// custom-pattern check.
pub use patterns::{validate_custom_patterns, SensitivePattern};

/// Re-exports the capture log writer and segment discovery helpers.
pub use rotation::{list_segments, segment_path, LogRotator, SegmentEntry};

/// Re-exports the suggestion-context assembler.
pub use context::ContextAssembler;

/// Re-exports the custom error type for clear error reporting.
pub use errors::SmartshError;
