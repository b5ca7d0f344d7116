//! Structured logging setup.
//!
//! Thin wrapper around `tracing-subscriber`, matching how the rest of this
//! family of binaries bootstraps logging: an `EnvFilter` defaulting to `info`,
//! JSON formatting available for production, pretty formatting for local use.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the global tracing subscriber. Safe to call once at process
/// start; subsequent calls are no-ops (errors from a second `try_init` are
/// swallowed).
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        fmt().with_env_filter(filter).json().try_init()
    } else {
        fmt().with_env_filter(filter).try_init()
    };

    if let Err(err) = result {
        eprintln!("telemetry already initialized: {err}");
    }
}
