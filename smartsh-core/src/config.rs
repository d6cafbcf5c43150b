//! Configuration value structs for `smartsh-core`.
//!
//! This module defines the immutable configuration consumed by the core:
//! the privacy filter settings, the capture log rotation parameters, and
//! the deterministic filesystem layout shared between the proxy session
//! and the suggestion flow. All of these are plain serde structs supplied
//! at startup and never mutated by the core.
//!
//! License: MIT OR Apache-2.0

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sensitivity tier controlling which subset of redaction patterns applies.
///
/// Levels are ordered; every level includes all patterns of the levels
/// below it. `None` disables pattern matching entirely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    /// No filtering at all.
    None,
    /// Common API key, token, and credential shapes.
    #[default]
    Basic,
    /// Basic plus emails in auth contexts, private IPs, and vendor tokens.
    Moderate,
    /// Moderate plus aggressive long-token, card, and ID matching.
    Strict,
}

/// Settings for the privacy filter.
///
/// Immutable once a [`crate::Filter`] has been constructed from it;
/// changing the level requires building a new filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Which built-in pattern tiers apply.
    pub level: FilterLevel,
    /// Master switch. When false the filter is an identity function.
    pub enabled: bool,
    /// Additional user-supplied regular expressions, applied after the
    /// built-ins in declaration order.
    pub custom_patterns: Vec<String>,
    /// Text substituted for every match.
    pub replacement_text: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            level: FilterLevel::Basic,
            enabled: true,
            custom_patterns: Vec::new(),
            replacement_text: DEFAULT_REPLACEMENT.to_string(),
        }
    }
}

/// Default replacement text for redacted matches.
pub const DEFAULT_REPLACEMENT: &str = "[REDACTED]";

/// Parameters bounding the on-disk capture log of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Maximum pre-compression size of a single segment file.
    pub max_segment_bytes: u64,
    /// Maximum number of sealed segments retained per session.
    pub max_segments: usize,
    /// Maximum age of a retained sealed segment, in seconds.
    pub max_age_secs: u64,
}

impl RotationConfig {
    /// Maximum sealed-segment age as a [`Duration`].
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_segment_bytes: 1024 * 1024,
            max_segments: 8,
            max_age_secs: 7 * 24 * 60 * 60,
        }
    }
}

/// The deterministic filesystem layout used by a proxy session and the
/// suggestion flow that reads from it.
///
/// All paths are threaded explicitly through the components that need
/// them rather than being baked in as compile-time literals; the layout
/// itself stays fixed so independent processes agree on where the lock
/// file and session logs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPaths {
    /// Lock file holding the recording process id as text.
    pub lock_path: PathBuf,
    /// Directory containing one subdirectory per recorded session.
    pub sessions_dir: PathBuf,
    /// Well-known file the latest suggestion is written to for the
    /// shell-side widget to pick up.
    pub suggestion_path: PathBuf,
    /// Shared append-only diagnostic log, written only in debug mode.
    pub diagnostic_log_path: PathBuf,
}

impl SessionPaths {
    /// Derives the standard layout for a lock scope.
    ///
    /// The lock file and the suggestion file live in the system temp
    /// directory keyed by scope; session logs live under the local data
    /// directory so they survive reboots for retention to clean up.
    pub fn for_scope(scope: &str) -> Self {
        let tmp = std::env::temp_dir();
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("smartsh");
        Self {
            lock_path: tmp.join(format!("smartsh-{scope}.lock")),
            sessions_dir: data_dir.join("sessions"),
            suggestion_path: tmp.join("smartsh-suggestion"),
            diagnostic_log_path: tmp.join("smartsh.log"),
        }
    }
}

/// Generates a time-based opaque session identifier.
///
/// Identifiers sort lexicographically by creation time, which is what
/// makes "the most recent session" well-defined for the context
/// assembler.
pub fn new_session_id() -> String {
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S"),
        std::process::id()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_levels_are_ordered() {
        assert!(FilterLevel::None < FilterLevel::Basic);
        assert!(FilterLevel::Basic < FilterLevel::Moderate);
        assert!(FilterLevel::Moderate < FilterLevel::Strict);
    }

    #[test]
    fn filter_level_serde_round_trip() {
        let json = serde_json::to_string(&FilterLevel::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
        let level: FilterLevel = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(level, FilterLevel::Strict);
    }

    #[test]
    fn default_filter_config() {
        let config = FilterConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, FilterLevel::Basic);
        assert_eq!(config.replacement_text, "[REDACTED]");
        assert!(config.custom_patterns.is_empty());
    }

    #[test]
    fn session_ids_sort_by_creation_time() {
        let id = new_session_id();
        // "YYYYMMDD-HHMMSS-pid"
        assert_eq!(id.split('-').count(), 3);
        assert!(id.len() >= "20260101-000000-1".len());
    }

    #[test]
    fn session_paths_are_keyed_by_scope() {
        let a = SessionPaths::for_scope("hosta");
        let b = SessionPaths::for_scope("hostb");
        assert_ne!(a.lock_path, b.lock_path);
        assert_eq!(a.sessions_dir, b.sessions_dir);
    }
}
