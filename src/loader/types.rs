//! Module registry and loaded-module data types (spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleType {
    Core,
    Vision,
    Code,
    Reasoning,
    Audio,
    Tools,
    Embedding,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    NotLoaded,
    Loading,
    Ready,
    Unloading,
    Error,
}

/// Unevictable threshold: a module with `priority >= PINNED_PRIORITY` is
/// never transitioned to `Unloading` (invariant I3).
pub const PINNED_PRIORITY: i32 = 10;

/// Immutable module metadata, mutated only by the loader under its lock
/// (the `usage_count`/`last_used` counters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub module_type: ModuleType,
    pub version: String,
    pub priority: i32,
    pub size_mb: u32,
    pub memory_requirement_mb: u32,
    pub dependencies: Vec<String>,
    pub capabilities: Vec<String>,
    pub quantization_supported: bool,
    pub model_path: String,
    pub tokenizer_path: Option<String>,
    pub usage_count: u64,
    pub last_used: Option<DateTime<Utc>>,
}

impl ModuleSpec {
    pub fn is_pinned(&self) -> bool {
        self.priority >= PINNED_PRIORITY
    }
}

/// A module's loader-tracked state. The `spec` is cloned into the entry at
/// registration time; the loader's usage-counter mutations go through this
/// copy, not the registry's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedModule {
    pub spec: ModuleSpec,
    pub status: ModuleStatus,
    pub load_time: Option<DateTime<Utc>>,
    pub memory_allocated_mb: u32,
    pub error_message: Option<String>,
}

impl LoadedModule {
    pub fn not_loaded(spec: ModuleSpec) -> Self {
        Self {
            spec,
            status: ModuleStatus::NotLoaded,
            load_time: None,
            memory_allocated_mb: 0,
            error_message: None,
        }
    }
}
