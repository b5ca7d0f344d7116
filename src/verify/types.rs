//! Shared data types for the Multi-Layer Verification Engine (spec §4.6).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which validator layers the engine will run. Matches the
/// `enabled_layers` entry in the external-interface config table (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLayer {
    Schema,
    Plausibility,
    Security,
    CrossReference,
    LlmCritique,
}

/// Record of a tool invocation, fed into the cross-reference and historical
/// accuracy steps of `verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub parameters: HashMap<String, Value>,
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
}

/// Either a verbatim response string or a structured payload. The engine
/// branches on this to decide which layers apply — schema validation only
/// runs against `Structured`, plausibility/security/critique only against
/// `Text` (spec §4.6: "output is text"/"output is a mapping").
#[derive(Debug, Clone)]
pub enum VerificationOutput {
    Text(String),
    Structured(serde_json::Map<String, Value>),
}

impl VerificationOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Map<String, Value>> {
        match self {
            Self::Text(_) => None,
            Self::Structured(m) => Some(m),
        }
    }
}

/// Fused confidence tier (spec §4.6: VeryLow<0.4, Low<0.6, Medium<0.75,
/// High<0.9, VeryHigh>=0.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence < 0.4 {
            Self::VeryLow
        } else if confidence < 0.6 {
            Self::Low
        } else if confidence < 0.75 {
            Self::Medium
        } else if confidence < 0.9 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

/// One entry in a `VerificationResult`'s flat issue list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationIssue {
    pub layer: &'static str,
    pub detail: String,
}

/// Complete output of [`crate::verify::engine::VerificationEngine::verify`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_verified: bool,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub layer_results: HashMap<String, Value>,
    pub issues: Vec<VerificationIssue>,
    pub recommendations: Vec<String>,
    pub cross_references: Option<Value>,
    pub security_scan: Option<Value>,
    pub timestamp: DateTime<Utc>,
}
