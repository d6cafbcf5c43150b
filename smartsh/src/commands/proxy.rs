// smartsh/src/commands/proxy.rs
//! The `proxy` command: wraps an interactive shell in the recording
//! session.

use anyhow::Result;
use log::info;
use smartsh_core::{SessionPaths, SmartshError};

use crate::cli::ProxyCommand;
use crate::config::Config;
use crate::session::{self, ProxyOptions};

/// Runs the proxy session and exits the process with the shell's code.
///
/// Never returns on success: the detached stdin-forwarding thread can
/// only be reaped by process exit, and the session has already sealed
/// its log and released its lock by the time we get here.
pub async fn run(cmd: ProxyCommand, config: &Config, quiet: bool) -> Result<()> {
    let scope = cmd
        .scope
        .or_else(|| config.scope.clone())
        .unwrap_or_else(session::default_scope);
    let paths = SessionPaths::for_scope(&scope);

    let mut rotation = config.rotation;
    if let Some(bytes) = cmd.max_segment_bytes {
        rotation.max_segment_bytes = bytes;
    }
    if let Some(count) = cmd.max_segments {
        rotation.max_segments = count;
    }
    if let Some(secs) = cmd.max_age_secs {
        rotation.max_age_secs = secs;
    }

    let options = ProxyOptions {
        shell: cmd.shell,
        paths,
        rotation,
    };

    match session::run_proxy(options).await {
        Ok(code) => std::process::exit(code),
        Err(e) => match e.downcast_ref::<SmartshError>() {
            // Lock contention is a benign no-op: the user already has a
            // recording session, which is exactly what they wanted.
            Some(SmartshError::SessionActive(pid)) => {
                info!("proxy start declined, session already active (pid {pid})");
                if !quiet {
                    eprintln!("smartsh: a recording session is already active (pid {pid})");
                }
                Ok(())
            }
            _ => Err(e),
        },
    }
}
