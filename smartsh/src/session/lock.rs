// smartsh/src/session/lock.rs
//! Single-instance session locking.
//!
//! At most one live proxy session may exist per lock scope. The lock is
//! a plain file holding the owning process id as text, created with an
//! atomic create-if-absent open. It is the only cross-process shared
//! resource in the system; no advisory-lock API is involved. A lock
//! whose recorded process is dead is stale and gets reclaimed.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use smartsh_core::SmartshError;

/// Stale-lock reclaims are retried a few times so that several sessions
/// started in quick succession still resolve to exactly one winner.
const MAX_ACQUIRE_ATTEMPTS: u32 = 3;

/// An acquired session lock. Released on drop, but only if the lock file
/// still names this process.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    pid: u32,
    released: bool,
}

impl SessionLock {
    /// Acquires the lock at `path` for the current process.
    ///
    /// Returns [`SmartshError::SessionActive`] when another live process
    /// holds it; callers treat that as a benign no-op, not a failure.
    pub fn acquire(path: &Path) -> Result<Self, SmartshError> {
        let pid = std::process::id();
        for attempt in 0..MAX_ACQUIRE_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    file.write_all(pid.to_string().as_bytes())?;
                    file.flush()?;
                    info!("acquired session lock {} (pid {pid})", path.display());
                    return Ok(Self {
                        path: path.to_path_buf(),
                        pid,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    match read_lock_pid(path) {
                        Some(owner) if process_alive(owner) => {
                            debug!(
                                "session lock {} held by live pid {owner}",
                                path.display()
                            );
                            return Err(SmartshError::SessionActive(owner));
                        }
                        Some(owner) => {
                            warn!(
                                "reclaiming stale session lock {} (pid {owner} is gone, attempt {})",
                                path.display(),
                                attempt + 1
                            );
                            reclaim(path, pid);
                        }
                        None => {
                            // A freshly-created lock may not have its pid
                            // written yet; give it a moment before
                            // declaring it garbage.
                            std::thread::sleep(std::time::Duration::from_millis(10));
                            if let Some(owner) = read_lock_pid(path) {
                                if process_alive(owner) {
                                    return Err(SmartshError::SessionActive(owner));
                                }
                            }
                            warn!("removing unreadable session lock {}", path.display());
                            reclaim(path, pid);
                        }
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(SmartshError::Fatal(format!(
            "could not acquire session lock {} after repeated stale-lock reclaims",
            path.display()
        )))
    }

    /// The pid recorded in the lock.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Removes the lock file, but only while it still names this
    /// process; a lock reclaimed by someone else is left alone.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if read_lock_pid(&self.path) == Some(self.pid) {
            match fs::remove_file(&self.path) {
                Ok(()) => debug!("released session lock {}", self.path.display()),
                Err(e) => warn!("failed to remove session lock {}: {e}", self.path.display()),
            }
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_lock_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Removes a stale lock through an atomic rename so that concurrent
/// reclaimers cannot each unlink-and-recreate: only one rename wins, and
/// the losers just retry the exclusive create.
fn reclaim(path: &Path, pid: u32) {
    let graveyard = path.with_extension(format!("stale.{pid}"));
    if fs::rename(path, &graveyard).is_ok() {
        let _ = fs::remove_file(&graveyard);
    }
}

/// Whether a process with the given pid exists.
#[cfg(unix)]
pub(crate) fn process_alive(pid: u32) -> bool {
    // Signal 0 performs the existence check without delivering anything;
    // EPERM still means the process exists, just not ours.
    let result = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if result == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub(crate) fn process_alive(_pid: u32) -> bool {
    // Without a cheap existence check, err on the side of treating the
    // lock as held.
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Far above any default pid_max, so no live process can own it.
    const DEAD_PID: u32 = 4_000_000;

    #[test]
    fn acquire_writes_our_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        let lock = SessionLock::acquire(&path).unwrap();
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        assert_eq!(lock.pid(), std::process::id());
    }

    #[test]
    fn release_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        let mut lock = SessionLock::acquire(&path).unwrap();
        lock.release();
        assert!(!path.exists());
    }

    #[test]
    fn drop_releases() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        {
            let _lock = SessionLock::acquire(&path).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_reports_session_active() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        let _lock = SessionLock::acquire(&path).unwrap();
        match SessionLock::acquire(&path) {
            Err(SmartshError::SessionActive(pid)) => assert_eq!(pid, std::process::id()),
            other => panic!("expected SessionActive, got {other:?}"),
        }
    }

    #[test]
    fn stale_lock_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        fs::write(&path, DEAD_PID.to_string()).unwrap();

        let lock = SessionLock::acquire(&path).unwrap();
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        drop(lock);
    }

    #[test]
    fn garbage_lock_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        fs::write(&path, "not a pid").unwrap();

        let lock = SessionLock::acquire(&path).unwrap();
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        drop(lock);
    }

    #[test]
    fn release_leaves_a_reclaimed_lock_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        let mut lock = SessionLock::acquire(&path).unwrap();

        // Simulate another process having reclaimed the lock.
        fs::write(&path, DEAD_PID.to_string()).unwrap();
        lock.release();
        assert!(path.exists());
        assert_eq!(read_lock_pid(&path), Some(DEAD_PID));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn concurrent_acquires_have_exactly_one_winner() {
        use std::sync::{Arc, Barrier};

        let dir = tempdir().unwrap();
        let path = dir.path().join("scope.lock");
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let mut handles = Vec::new();
        for _ in 0..threads {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            handles.push(std::thread::spawn(move || {
                let result = SessionLock::acquire(&path);
                let won = match &result {
                    Ok(_) => true,
                    Err(SmartshError::SessionActive(_)) => false,
                    Err(e) => panic!("unexpected error: {e}"),
                };
                // The winner holds the lock until everyone has raced.
                barrier.wait();
                drop(result);
                won
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
    }
}
