//! Tracing subscriber setup.
//!
//! Logs go to stderr: stdout is reserved for the JSON-RPC protocol.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber with the given filter directive.
///
/// `RUST_LOG`, when set, takes precedence over `filter`. Returns `false` if a
/// global subscriber was already installed.
pub fn init(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
