//! The privacy filter: deterministic redaction of sensitive substrings
//! from arbitrary shell text.
//!
//! A [`Filter`] is built once from a [`FilterConfig`] and is immutable
//! afterwards; changing the level or patterns requires constructing a new
//! instance. Patterns apply sequentially over the progressively filtered
//! string, so an earlier replacement can prevent a later, broader pattern
//! from matching an already-redacted token, but never reveals original
//! content.
//!
//! License: MIT OR Apache-2.0

use std::borrow::Cow;

use crate::config::{FilterConfig, FilterLevel};
use crate::patterns::{compile_patterns, SensitivePattern};

/// A privacy filter with its compiled pattern set.
#[derive(Debug)]
pub struct Filter {
    config: FilterConfig,
    patterns: Vec<SensitivePattern>,
}

impl Filter {
    /// Builds a filter from the given configuration.
    ///
    /// Malformed custom patterns are skipped (with a diagnostic warning)
    /// rather than failing construction: one bad pattern must not
    /// disable the rest of the pipeline.
    pub fn new(config: FilterConfig) -> Self {
        let patterns = compile_patterns(&config);
        Self { config, patterns }
    }

    /// The configuration this filter was built from.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    fn is_identity(&self) -> bool {
        !self.config.enabled || self.config.level == FilterLevel::None
    }

    /// Redacts sensitive substrings from `text`.
    ///
    /// Returns the input unchanged when the filter is disabled or the
    /// level is `None`. Otherwise every applicable pattern is applied in
    /// a fixed order, each as a global replace-all.
    pub fn filter_text(&self, text: &str) -> String {
        if self.is_identity() {
            return text.to_string();
        }

        let mut filtered = text.to_string();
        for pattern in &self.patterns {
            if pattern.min_level > self.config.level {
                continue;
            }
            if let Cow::Owned(replaced) = pattern
                .regex
                .replace_all(&filtered, pattern.replacement.as_str())
            {
                filtered = replaced;
            }
        }
        filtered
    }

    /// Redacts each line independently. Line count and order are
    /// preserved exactly; non-matching lines come back byte-identical.
    pub fn filter_lines(&self, lines: &[String]) -> Vec<String> {
        if self.is_identity() {
            return lines.to_vec();
        }
        lines.iter().map(|line| self.filter_text(line)).collect()
    }

    /// Redacts multiline text line by line.
    ///
    /// Splitting on `'\n'` and rejoining with `'\n'` round-trips a
    /// trailing newline faithfully: the split yields a final empty
    /// element which the join restores.
    pub fn filter_multiline_text(&self, text: &str) -> String {
        if self.is_identity() {
            return text.to_string();
        }
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        self.filter_lines(&lines).join("\n")
    }

    /// Returns the names of every applicable pattern that matches
    /// somewhere in `text`, without revealing what matched.
    ///
    /// Used for diagnostics only; empty when the filter is disabled.
    pub fn detect_sensitive_patterns(&self, text: &str) -> Vec<String> {
        if self.is_identity() {
            return Vec::new();
        }
        self.patterns
            .iter()
            .filter(|p| p.min_level <= self.config.level && p.regex.is_match(text))
            .map(|p| p.name.clone())
            .collect()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
