//! AMAIMA Core: the decision-and-execution core of an AI query-serving
//! platform.
//!
//! Three subsystems, each usable independently:
//!
//! - [`router`] — the Smart Router: query complexity analysis, security
//!   classification, and device/connectivity-aware execution-mode selection.
//! - [`loader`] — the Progressive Model Loader: a registry-backed load/unload
//!   state machine with a memory ledger, quantization seam, and a
//!   usage-predicting background preloader.
//! - [`verify`] — the Multi-Layer Verification Engine: schema, plausibility,
//!   security, cross-reference, and critique layers fused into one
//!   confidence score.
//!
//! [`probes`] supplies the device/connectivity snapshots the router consumes.
//! [`config`], [`error`], [`telemetry`], and [`observability`] are the
//! ambient stack shared by all three.

pub mod config;
pub mod error;
pub mod loader;
pub mod observability;
pub mod probes;
pub mod router;
pub mod telemetry;
pub mod verify;

pub use config::RuntimeConfig;
pub use error::{AmaimaError, Result};
