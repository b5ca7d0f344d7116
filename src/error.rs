//! Crate-wide error type.
//!
//! Only the loader boundary raises errors to callers (spec §7): unknown
//! modules, failed reservations, and transitive dependency failures.
//! Quantization and probe failures are downgraded internally and never reach
//! this type; verification outcomes are data (`VerificationResult`), not
//! errors.

use thiserror::Error;

/// Errors that can cross the [`crate::loader`] boundary.
#[derive(Debug, Error)]
pub enum AmaimaError {
    #[error("module not registered: {0}")]
    UnknownModule(String),

    #[error("out of memory: could not reserve {requested_mb} MB for {module}")]
    OutOfMemory { module: String, requested_mb: u32 },

    #[error("dependency '{dependency}' failed to load for module '{module}'")]
    DependencyFailure { module: String, dependency: String },
}

pub type Result<T> = std::result::Result<T, AmaimaError>;
