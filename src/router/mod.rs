//! Smart Router subsystem (spec §4.2–§4.4): complexity analysis, security
//! classification, and the router that fuses both with live probes into a
//! `RoutingDecision`.

pub mod complexity;
pub mod security;
pub mod smart_router;
pub mod types;

pub use complexity::{ComplexityAnalyzer, ComplexityResult};
pub use security::SecurityClassifier;
pub use smart_router::{RouterConfig, SmartRouter};
pub use types::{ExecutionMode, ModelSize, QueryComplexity, RoutingDecision, SecurityLevel};
