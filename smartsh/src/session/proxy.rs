// smartsh/src/session/proxy.rs
//! The recording proxy session.
//!
//! Wraps an interactive shell in a pseudo-terminal and duplicates
//! everything the shell writes into the capture log while forwarding it
//! to the real terminal, so the interactive experience is unchanged.
//! The session runs until the shell exits or a termination signal
//! arrives; either way the copy loop drains the pty to EOF before the
//! final segment is sealed, so capture is never truncated.
//!
//! Two activities run concurrently while recording: the pty-to-terminal
//! copy loop and the exit watcher for the spawned shell. They meet on a
//! completion signal; the only shared mutable state is the rotator's
//! append, which is serialized internally.

use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::terminal;
use is_terminal::IsTerminal;
use log::{debug, info, warn};
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use smartsh_core::{new_session_id, LogRotator, RotationConfig, SessionPaths, SmartshError};

use super::lock::SessionLock;

/// Environment marker exported into the recorded shell so a nested
/// start can be detected and declined.
pub const PROXY_ENV_MARKER: &str = "SMARTSH_PROXY";

/// Everything a proxy session needs, supplied by the caller.
pub struct ProxyOptions {
    /// Shell to spawn; `$SHELL` (then `/bin/sh`) when absent.
    pub shell: Option<String>,
    pub paths: SessionPaths,
    pub rotation: RotationConfig,
}

/// Runs one complete proxy session and returns the shell's exit code.
///
/// The state machine is linear: acquire the lock, allocate the pty and
/// spawn the shell, record until EOF, then seal and release. A start
/// attempt that fails is reported upward and never retried; terminal
/// recording must not silently restart inside a user's session.
pub async fn run(opts: ProxyOptions) -> Result<i32> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        return Err(SmartshError::Fatal(
            "the proxy must be started from an interactive terminal".to_string(),
        )
        .into());
    }
    if std::env::var_os(PROXY_ENV_MARKER).is_some() {
        return Err(SmartshError::SessionActive(std::process::id()).into());
    }

    // Idle -> Starting: the lock decides whether we may record at all.
    let mut lock = SessionLock::acquire(&opts.paths.lock_path)?;

    let session_id = new_session_id();
    let session_dir = opts.paths.sessions_dir.join(&session_id);
    let rotator = Arc::new(LogRotator::create(&session_dir, opts.rotation)?);
    info!("recording session {session_id} into {}", session_dir.display());

    // Starting -> Recording: allocate the pty pair and attach the shell
    // to its follower side.
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| SmartshError::PtyOpen(e.to_string()))?;

    let shell = opts
        .shell
        .or_else(|| std::env::var("SHELL").ok())
        .unwrap_or_else(|| "/bin/sh".to_string());
    let mut cmd = CommandBuilder::new(&shell);
    cmd.env(PROXY_ENV_MARKER, "1");
    if let Ok(cwd) = std::env::current_dir() {
        cmd.cwd(cwd);
    }

    let mut child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| SmartshError::ShellSpawn(e.to_string()))?;
    drop(pair.slave);
    debug!("spawned {shell} ({cols}x{rows})");

    let master = pair.master;
    let mut pty_reader = master
        .try_clone_reader()
        .map_err(|e| SmartshError::PtyOpen(e.to_string()))?;
    let mut pty_writer = master
        .take_writer()
        .map_err(|e| SmartshError::PtyOpen(e.to_string()))?;
    let mut killer = child.clone_killer();

    let raw_guard = RawModeGuard::enable()?;

    // Copy loop: pty leader -> real terminal + capture log. Runs on a
    // blocking thread; signals completion once the pty reaches EOF.
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let copy_rotator = Arc::clone(&rotator);
    tokio::task::spawn_blocking(move || {
        let mut stdout = io::stdout();
        let mut buf = [0u8; 8192];
        loop {
            match pty_reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    // Forward to the user first so interactivity never
                    // waits on the capture path.
                    if stdout
                        .write_all(&buf[..n])
                        .and_then(|()| stdout.flush())
                        .is_err()
                    {
                        break;
                    }
                    copy_rotator.write(&buf[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // On most platforms the leader read errors out once the
                // shell exits; treat it the same as EOF.
                Err(_) => break,
            }
        }
        let _ = done_tx.send(());
    });

    // Input loop: real stdin -> pty leader. A plain detached thread: a
    // blocking stdin read cannot be cancelled, and the process exits
    // with the shell anyway.
    std::thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if pty_writer
                        .write_all(&buf[..n])
                        .and_then(|()| pty_writer.flush())
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    });

    // Exit watcher: observes the spawned shell. Termination signals are
    // forwarded to the shell rather than handled here, so teardown
    // always flows through the same EOF path.
    let mut wait_task = tokio::task::spawn_blocking(move || child.wait());

    #[cfg(unix)]
    let status = {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
        let mut sigwinch = signal(SignalKind::window_change())
            .context("failed to install SIGWINCH handler")?;
        loop {
            tokio::select! {
                status = &mut wait_task => {
                    break status.context("exit watcher failed")?.context("failed to wait for shell")?;
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, stopping the recorded shell");
                    let _ = killer.kill();
                }
                _ = sigint.recv() => {
                    info!("received SIGINT, stopping the recorded shell");
                    let _ = killer.kill();
                }
                _ = sigwinch.recv() => {
                    if let Ok((cols, rows)) = terminal::size() {
                        let _ = master.resize(PtySize {
                            rows,
                            cols,
                            pixel_width: 0,
                            pixel_height: 0,
                        });
                    }
                }
            }
        }
    };
    #[cfg(not(unix))]
    let status = wait_task
        .await
        .context("exit watcher failed")?
        .context("failed to wait for shell")?;

    // Recording -> Terminating: the shell is gone, but the copy loop
    // must drain the pty to EOF before the final segment is sealed.
    let _ = done_rx.await;

    // Terminating -> Idle: seal, release, restore.
    rotator.finish();
    lock.release();
    drop(raw_guard);
    drop(master);

    let code = status.exit_code() as i32;
    info!("session {session_id} finished with exit code {code}");
    Ok(code)
}

/// Puts the real terminal into raw mode for the lifetime of the session
/// and restores it afterwards, even on early error returns.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to restore terminal mode: {e}");
        }
    }
}
