//! Multi-Layer Verification Engine: schema, plausibility, security,
//! cross-reference, and LLM-critique layers fused into one confidence
//! score (spec §4.6).

pub mod critic;
pub mod cross_reference;
pub mod engine;
pub mod plausibility;
pub mod schema;
pub mod security_scan;
pub mod types;

pub use critic::{CritiqueResult, LlmCritic};
pub use cross_reference::{ConsensusResult, ConsensusSource, CrossReferenceValidator, SourceValue};
pub use engine::{VerificationContext, VerificationEngine};
pub use plausibility::{NumericCheck, PlausibilityChecker, PlausibilityReport};
pub use schema::{FieldSchema, FieldType, Schema, SchemaValidator};
pub use security_scan::{RegexSecurityScanner, SecurityScanReport, SecurityScanner, Severity, Vulnerability};
pub use types::{
    ConfidenceLevel, ToolResult, VerificationIssue, VerificationLayer, VerificationOutput, VerificationResult,
};
