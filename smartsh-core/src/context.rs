//! Assembles the redacted context string handed to a provider client.
//!
//! The assembler is stateless: at suggestion time it reads whatever the
//! proxy session has written so far (decoupled through the filesystem,
//! never through a direct call), redacts it together with the shell
//! history, and returns one combined string. Provider-specific formatting
//! is someone else's job.
//!
//! License: MIT OR Apache-2.0

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use flate2::read::GzDecoder;
use log::debug;

use crate::filter::Filter;
use crate::rotation::list_segments;

/// Builds the redacted suggestion context from captured terminal output
/// and shell history.
pub struct ContextAssembler {
    filter: Filter,
    max_lines: usize,
}

impl ContextAssembler {
    pub fn new(filter: Filter, max_lines: usize) -> Self {
        Self { filter, max_lines }
    }

    /// Most recent session directory under `sessions_dir`, if any.
    ///
    /// Session identifiers are time-based and sort lexicographically, so
    /// the maximum directory name is the newest session.
    pub fn latest_session_dir(sessions_dir: &Path) -> Result<Option<PathBuf>> {
        if !sessions_dir.exists() {
            return Ok(None);
        }
        let mut latest: Option<(String, PathBuf)> = None;
        for entry in fs::read_dir(sessions_dir)
            .with_context(|| format!("failed to list sessions in {}", sessions_dir.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if latest.as_ref().is_none_or(|(newest, _)| name > *newest) {
                latest = Some((name, entry.path()));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }

    /// Reads the most recent captured output and the given history lines,
    /// redacts both, and returns the combined context string.
    ///
    /// `session_dir` may be `None` when no proxy session has recorded
    /// anything yet; history is still included (and still redacted).
    pub fn assemble(&self, session_dir: Option<&Path>, history: &[String]) -> Result<String> {
        let captured = match session_dir {
            Some(dir) => self.recent_output(dir)?,
            None => String::new(),
        };
        let captured = self.filter.filter_multiline_text(&captured);
        let history = self.filter.filter_lines(history);

        let mut context = String::new();
        context.push_str("Recent terminal output:\n");
        context.push_str(&captured);
        if !captured.ends_with('\n') {
            context.push('\n');
        }
        context.push_str("\nRecent shell history:\n");
        for line in &history {
            context.push_str(line);
            context.push('\n');
        }
        Ok(context)
    }

    /// The last `max_lines` lines recorded in `dir`, newest segment
    /// first, walking back through sealed compressed segments until
    /// enough lines are gathered.
    fn recent_output(&self, dir: &Path) -> Result<String> {
        let segments = list_segments(dir)
            .with_context(|| format!("failed to list segments in {}", dir.display()))?;

        let mut lines: Vec<String> = Vec::new();
        for segment in segments.iter().rev() {
            if lines.len() >= self.max_lines {
                break;
            }
            let text = read_segment(&segment.path, segment.compressed)
                .with_context(|| format!("failed to read segment {}", segment.path.display()))?;
            debug!(
                "read {} bytes of captured output from {}",
                text.len(),
                segment.path.display()
            );
            let mut segment_lines: Vec<String> = text
                .lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect();
            segment_lines.extend(lines);
            lines = segment_lines;
        }

        let skip = lines.len().saturating_sub(self.max_lines);
        Ok(lines[skip..].join("\n"))
    }
}

/// Reads a segment file as text, transparently gunzipping sealed
/// segments and stripping ANSI escape sequences from the raw pty bytes.
fn read_segment(path: &Path, compressed: bool) -> std::io::Result<String> {
    let mut raw = Vec::new();
    if compressed {
        GzDecoder::new(File::open(path)?).read_to_end(&mut raw)?;
    } else {
        File::open(path)?.read_to_end(&mut raw)?;
    }
    let stripped = strip_ansi_escapes::strip(&raw);
    Ok(String::from_utf8_lossy(&stripped).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    #[test]
    fn assemble_without_capture_still_redacts_history() {
        let assembler = ContextAssembler::new(Filter::new(FilterConfig::default()), 10);
        let history = vec![
            "ls -la".to_string(),
            "export API_KEY=sk-1234567890abcdef1234567890abcdef1234567890abcdef12".to_string(),
        ];
        let context = assembler.assemble(None, &history).unwrap();
        assert!(context.contains("ls -la"));
        assert!(context.contains("[REDACTED]"));
        assert!(!context.contains("sk-12345"));
    }
}
