//! Quantizer interface (spec §4.5.3 step 7, §6).
//!
//! Pluggable model-file optimization: `supports`/`quantize`. Must be
//! idempotent keyed by `(path, precision)` and must never raise to the
//! loader — failures downgrade to "no quantization" (spec §7
//! `QuantizationFailure`). The bundled [`NoopQuantizer`] is the
//! self-contained fallback the original's `TensorRTQuantizer` degrades to
//! whenever the real ONNX/TensorRT toolchain isn't available.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Quantization target precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Int8,
    Fp16,
    Bf16,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Fp16 => "fp16",
            Self::Bf16 => "bf16",
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::Int8
    }
}

/// `(path, precision) -> new_path, reduction_pct`. Infallible by contract:
/// an implementation that hits a real error must catch it internally and
/// report a no-op result, not propagate.
pub trait Quantizer: Send + Sync {
    fn supports(&self, path: &Path) -> bool;

    /// `max_batch` is accepted for interface parity with the external
    /// toolchain contract (spec §6) but is advisory only — nothing in this
    /// crate observably varies its output on it (spec §9 Open Questions).
    fn quantize(&self, path: &Path, precision: Precision, max_batch: u32) -> (PathBuf, f64);
}

/// Self-contained fallback: reports `supports()` as whatever the caller
/// tells it (mirroring `spec.quantization_supported`), and on `quantize`
/// returns the path unchanged with a 0.0 reduction, memoized so repeated
/// calls for the same `(path, precision)` are idempotent and cheap.
pub struct NoopQuantizer {
    enabled: bool,
    cache: Mutex<HashMap<(PathBuf, Precision), (PathBuf, f64)>>,
}

impl NoopQuantizer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl Quantizer for NoopQuantizer {
    fn supports(&self, _path: &Path) -> bool {
        self.enabled
    }

    fn quantize(&self, path: &Path, precision: Precision, _max_batch: u32) -> (PathBuf, f64) {
        let key = (path.to_path_buf(), precision);
        let mut cache = self.cache.lock().unwrap();
        if let Some(cached) = cache.get(&key) {
            return cached.clone();
        }
        let result = (path.to_path_buf(), 0.0);
        tracing::debug!(
            path = %path.display(),
            precision = precision.as_str(),
            "quantization not performed, no-op fallback"
        );
        cache.insert(key, result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_quantizer_returns_same_path() {
        let q = NoopQuantizer::new(true);
        let (path, reduction) = q.quantize(Path::new("/models/foo"), Precision::Int8, 32);
        assert_eq!(path, PathBuf::from("/models/foo"));
        assert_eq!(reduction, 0.0);
    }

    #[test]
    fn noop_quantizer_idempotent() {
        let q = NoopQuantizer::new(true);
        let first = q.quantize(Path::new("/models/foo"), Precision::Int8, 32);
        let second = q.quantize(Path::new("/models/foo"), Precision::Int8, 64);
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_quantizer_reports_unsupported() {
        let q = NoopQuantizer::new(false);
        assert!(!q.supports(Path::new("/models/foo")));
    }
}
