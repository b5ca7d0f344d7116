//! Shared data types for the smart router.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered complexity tier. Ordering matters: the decision policy and the
/// complexity analyzer's length adjustment compare tiers numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryComplexity {
    Trivial = 1,
    Simple = 2,
    Moderate = 3,
    Complex = 4,
    Expert = 5,
}

impl QueryComplexity {
    /// One step down, saturating at `Trivial`.
    pub fn decrement(self) -> Self {
        match self {
            Self::Trivial => Self::Trivial,
            Self::Simple => Self::Trivial,
            Self::Moderate => Self::Simple,
            Self::Complex => Self::Moderate,
            Self::Expert => Self::Complex,
        }
    }

    /// One step up, saturating at `Expert`.
    pub fn increment(self) -> Self {
        match self {
            Self::Trivial => Self::Simple,
            Self::Simple => Self::Moderate,
            Self::Moderate => Self::Complex,
            Self::Complex => Self::Expert,
            Self::Expert => Self::Expert,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::Expert => "expert",
        }
    }
}

/// Where a query should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    OfflineLocal,
    HybridLocalFirst,
    HybridCloudFirst,
    CloudOnly,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OfflineLocal => "offline_local",
            Self::HybridLocalFirst => "hybrid_local_first",
            Self::HybridCloudFirst => "hybrid_cloud_first",
            Self::CloudOnly => "cloud_only",
        }
    }
}

/// Model size class with intrinsic resource requirements. Numbers are part
/// of the contract: the router compares them against live availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSize {
    Nano1B,
    Small3B,
    Medium7B,
    Large13B,
    XL34B,
    Ultra200B,
}

impl ModelSize {
    pub const ALL: [ModelSize; 6] = [
        ModelSize::Nano1B,
        ModelSize::Small3B,
        ModelSize::Medium7B,
        ModelSize::Large13B,
        ModelSize::XL34B,
        ModelSize::Ultra200B,
    ];

    pub fn ram_gb(self) -> f64 {
        match self {
            Self::Nano1B => 2.0,
            Self::Small3B => 6.0,
            Self::Medium7B => 14.0,
            Self::Large13B => 26.0,
            Self::XL34B => 68.0,
            Self::Ultra200B => 400.0,
        }
    }

    pub fn vram_gb(self) -> f64 {
        match self {
            Self::Nano1B => 0.5,
            Self::Small3B => 2.0,
            Self::Medium7B => 4.0,
            Self::Large13B => 8.0,
            Self::XL34B => 16.0,
            Self::Ultra200B => 80.0,
        }
    }

    pub fn parameter_class(self) -> &'static str {
        match self {
            Self::Nano1B => "1B",
            Self::Small3B => "3B",
            Self::Medium7B => "7B",
            Self::Large13B => "13B",
            Self::XL34B => "34B",
            Self::Ultra200B => "200B",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nano1B => "nano_1b",
            Self::Small3B => "small_3b",
            Self::Medium7B => "medium_7b",
            Self::Large13B => "large_13b",
            Self::XL34B => "xl_34b",
            Self::Ultra200B => "ultra_200b",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Standard,
    Elevated,
    Critical,
}

impl SecurityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Elevated => "elevated",
            Self::Critical => "critical",
        }
    }
}

/// Immutable record describing how a query should be executed. Produced by
/// [`crate::router::smart_router::SmartRouter::route`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub execution_mode: ExecutionMode,
    pub model_size: ModelSize,
    pub complexity: QueryComplexity,
    pub security_level: SecurityLevel,
    pub confidence: f64,
    pub estimated_latency_ms: f64,
    pub estimated_cost: Decimal,
    pub fallback_chain: Vec<ExecutionMode>,
    pub reasoning: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
