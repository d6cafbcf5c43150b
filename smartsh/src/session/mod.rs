// smartsh/src/session/mod.rs
//! Proxy session management: single-instance locking and the recording
//! pty proxy.

pub mod lock;
pub mod proxy;

pub use lock::SessionLock;
pub use proxy::{run as run_proxy, ProxyOptions, PROXY_ENV_MARKER};

/// The default lock scope: this host's name, so one recording session
/// may exist per machine unless the user configures something narrower.
pub fn default_scope() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "default".to_string())
}
