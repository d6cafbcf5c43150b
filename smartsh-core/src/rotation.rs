//! Size-bounded, compressed, retention-swept capture logs.
//!
//! A [`LogRotator`] accepts a continuous byte stream and persists it
//! across numbered segment files inside one session directory. When a
//! segment reaches the configured size it is sealed and handed to a
//! detached compression worker, so capture throughput never waits on
//! compression of a previous segment. The write path is serialized by a
//! single internal lock: segment sealing and the next append can never
//! interleave, and a termination-time flush waits for any in-flight
//! append to complete.
//!
//! Failure semantics follow the capture contract: if the filesystem
//! becomes unwritable mid-session, further bytes are dropped and the
//! condition is reported through the diagnostic log. Recording problems
//! must never take down the host shell.
//!
//! License: MIT OR Apache-2.0

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, warn};

use crate::config::RotationConfig;

const SEGMENT_PREFIX: &str = "segment-";
const SEGMENT_SUFFIX: &str = ".log";
const COMPRESSED_SUFFIX: &str = ".log.gz";

/// One segment file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentEntry {
    /// Monotonic per-session sequence number.
    pub seq: u64,
    pub path: PathBuf,
    /// Whether the file is a sealed, gzip-compressed segment.
    pub compressed: bool,
}

struct Writer {
    file: Option<File>,
    seq: u64,
    written: u64,
    degraded: bool,
}

/// Appends captured bytes to bounded segment files in a session
/// directory, sealing, compressing, and sweeping as it goes.
pub struct LogRotator {
    dir: PathBuf,
    config: RotationConfig,
    inner: Mutex<Writer>,
    compressors: Mutex<Vec<JoinHandle<()>>>,
}

impl LogRotator {
    /// Creates the session directory and opens segment zero.
    pub fn create(dir: impl Into<PathBuf>, config: RotationConfig) -> Result<Self> {
        if config.max_segment_bytes == 0 {
            bail!("max_segment_bytes must be greater than zero");
        }
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create session log directory {}", dir.display()))?;
        let file = open_segment(&dir, 0)?;
        Ok(Self {
            dir,
            config,
            inner: Mutex::new(Writer {
                file: Some(file),
                seq: 0,
                written: 0,
                degraded: false,
            }),
            compressors: Mutex::new(Vec::new()),
        })
    }

    /// The session directory this rotator writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sequence number of the current (unsealed) segment.
    pub fn current_seq(&self) -> u64 {
        self.lock_writer().seq
    }

    /// Appends `bytes` to the capture log.
    ///
    /// Infallible by contract: when the segment cannot be written the
    /// bytes are dropped and the condition is logged. Writes larger than
    /// the segment bound are split across segments so every sealed
    /// segment stays within `max_segment_bytes`.
    pub fn write(&self, bytes: &[u8]) {
        let mut writer = self.lock_writer();
        let mut remaining = bytes;
        while !remaining.is_empty() {
            if writer.degraded {
                return;
            }
            let capacity = (self.config.max_segment_bytes - writer.written) as usize;
            let take = remaining.len().min(capacity);
            let (chunk, rest) = remaining.split_at(take);
            let outcome = match writer.file.as_mut() {
                Some(file) => file.write_all(chunk),
                None => return,
            };
            if let Err(e) = outcome {
                warn!("capture write failed, dropping bytes for this segment: {e}");
                writer.degraded = true;
                return;
            }
            writer.written += take as u64;
            if writer.written >= self.config.max_segment_bytes {
                self.rotate(&mut writer);
            }
            remaining = rest;
        }
    }

    /// Flushes and closes the current segment and waits for outstanding
    /// compression workers. Called exactly once at session termination;
    /// holding the writer lock here is what guarantees no in-flight
    /// append is truncated.
    pub fn finish(&self) {
        {
            let mut writer = self.lock_writer();
            if let Some(mut file) = writer.file.take() {
                if let Err(e) = file.flush() {
                    warn!("failed to flush final segment: {e}");
                }
            }
        }
        self.wait_for_compression();
    }

    /// Blocks until every spawned compression worker has finished.
    pub fn wait_for_compression(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut compressors = self.compressors.lock().unwrap();
            compressors.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    fn lock_writer(&self) -> MutexGuard<'_, Writer> {
        // A poisoned lock only means a prior panic elsewhere; keep capturing.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seals the current segment, schedules its compression, opens the
    /// next segment, and runs the retention sweep.
    fn rotate(&self, writer: &mut Writer) {
        if let Some(mut file) = writer.file.take() {
            if let Err(e) = file.flush() {
                warn!("failed to flush segment {} before sealing: {e}", writer.seq);
            }
            drop(file);
            let sealed = segment_path(&self.dir, writer.seq);
            debug!("sealed segment {}", sealed.display());
            let handle = std::thread::spawn(move || compress_segment(&sealed));
            self.compressors.lock().unwrap().push(handle);
        }

        writer.seq += 1;
        writer.written = 0;
        match open_segment(&self.dir, writer.seq) {
            Ok(file) => {
                writer.file = Some(file);
                writer.degraded = false;
            }
            Err(e) => {
                warn!("failed to open segment {}: {e}", writer.seq);
                writer.degraded = true;
            }
        }

        self.sweep(writer.seq);
    }

    /// Deletes the oldest sealed segments beyond `max_segments` and any
    /// sealed segment older than `max_age`. Deletion failures are logged,
    /// never fatal.
    fn sweep(&self, current_seq: u64) {
        let mut sealed = match list_segments(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("retention sweep could not list segments: {e}");
                return;
            }
        };
        sealed.retain(|entry| entry.seq != current_seq);

        let excess = sealed.len().saturating_sub(self.config.max_segments);
        let (oldest, rest) = sealed.split_at(excess);
        for entry in oldest {
            remove_segment(&entry.path, "beyond retention count");
        }

        let max_age = self.config.max_age();
        for entry in rest {
            let expired = fs::metadata(&entry.path)
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
                .map(|age| age > max_age)
                .unwrap_or(false);
            if expired {
                remove_segment(&entry.path, "beyond retention age");
            }
        }
    }
}

fn remove_segment(path: &Path, reason: &str) {
    match fs::remove_file(path) {
        Ok(()) => debug!("removed segment {} ({reason})", path.display()),
        Err(e) => warn!("failed to remove segment {}: {e}", path.display()),
    }
}

fn open_segment(dir: &Path, seq: u64) -> Result<File> {
    let path = segment_path(dir, seq);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open segment {}", path.display()))
}

/// Path of the (uncompressed) segment with the given sequence number.
pub fn segment_path(dir: &Path, seq: u64) -> PathBuf {
    dir.join(format!("{SEGMENT_PREFIX}{seq:04}{SEGMENT_SUFFIX}"))
}

/// Lists every segment file in `dir`, sorted by sequence number.
pub fn list_segments(dir: &Path) -> std::io::Result<Vec<SegmentEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(entry) = parse_segment_name(name).map(|(seq, compressed)| SegmentEntry {
            seq,
            path: entry.path(),
            compressed,
        }) else {
            continue;
        };
        entries.push(entry);
    }
    entries.sort_by_key(|entry| (entry.seq, entry.compressed));
    Ok(entries)
}

fn parse_segment_name(name: &str) -> Option<(u64, bool)> {
    let rest = name.strip_prefix(SEGMENT_PREFIX)?;
    if let Some(seq) = rest.strip_suffix(COMPRESSED_SUFFIX) {
        return seq.parse().ok().map(|seq| (seq, true));
    }
    let seq = rest.strip_suffix(SEGMENT_SUFFIX)?;
    seq.parse().ok().map(|seq| (seq, false))
}

/// Replaces a sealed segment with its gzip-compressed artifact.
///
/// Runs on a detached worker. On failure the partial artifact is removed
/// and the plaintext segment is left in place, so content is preserved
/// either way.
fn compress_segment(path: &Path) {
    let gz_path = compressed_segment_path(path);
    let result = (|| -> std::io::Result<()> {
        let mut input = File::open(path)?;
        let output = File::create(&gz_path)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        std::io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
        fs::remove_file(path)
    })();
    match result {
        Ok(()) => debug!("compressed segment {}", gz_path.display()),
        Err(e) => {
            warn!("failed to compress segment {}: {e}", path.display());
            let _ = fs::remove_file(&gz_path);
        }
    }
}

fn compressed_segment_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".gz");
    PathBuf::from(name)
}
