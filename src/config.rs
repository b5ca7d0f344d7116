//! Runtime configuration.
//!
//! Mirrors the defaults table in the external interface contract: loaded from
//! an optional TOML file, then overridden by `AMAIMA_*` environment
//! variables for the fields most often tuned per-deployment. Priority is
//! env var > config file > built-in default, the same order the rest of
//! this family of tools uses for settings resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::verify::types::VerificationLayer;

/// Step 1: Memory budget.
/// Step 2: Quantization and loader tuning.
/// Step 3: Router cache tuning.
/// Step 4: Verification tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    // -- Step 1: Memory budget --
    pub max_memory_mb: u32,
    pub reserved_mb: u32,

    // -- Step 2: Quantization and loader tuning --
    pub enable_quantization: bool,
    pub preload_threshold: f64,

    // -- Step 3: Router cache tuning --
    pub cache_ttl_s: u64,

    // -- Step 4: Verification tuning --
    pub verification_threshold: f64,
    pub enabled_layers: Vec<VerificationLayer>,
    pub history_ttl_days: i64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 8192,
            reserved_mb: 1024,
            enable_quantization: true,
            preload_threshold: 0.5,
            cache_ttl_s: 5,
            verification_threshold: 0.7,
            enabled_layers: vec![
                VerificationLayer::Schema,
                VerificationLayer::Plausibility,
                VerificationLayer::CrossReference,
                VerificationLayer::LlmCritique,
            ],
            history_ttl_days: 30,
        }
    }
}

impl RuntimeConfig {
    /// Load defaults, overlay a TOML file if present, then overlay env vars.
    pub fn load(config_path: Option<&Path>) -> Self {
        let mut config = match config_path {
            Some(path) => Self::from_file(path).unwrap_or_default(),
            None => Self::default_config_path()
                .and_then(|path| Self::from_file(&path).ok())
                .unwrap_or_default(),
        };
        config.apply_env_overrides();
        config
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("amaima").join("config.toml"))
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u32("AMAIMA_MAX_MEMORY_MB") {
            self.max_memory_mb = v;
        }
        if let Some(v) = env_u32("AMAIMA_RESERVED_MB") {
            self.reserved_mb = v;
        }
        if let Some(v) = env_bool("AMAIMA_ENABLE_QUANTIZATION") {
            self.enable_quantization = v;
        }
        if let Some(v) = env_f64("AMAIMA_PRELOAD_THRESHOLD") {
            self.preload_threshold = v;
        }
        if let Some(v) = env_u64("AMAIMA_CACHE_TTL_S") {
            self.cache_ttl_s = v;
        }
        if let Some(v) = env_f64("AMAIMA_VERIFICATION_THRESHOLD") {
            self.verification_threshold = v;
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok()?.parse().ok()
}
