//! Device capability probe.
//!
//! Wrapped behind a trait so tests can inject deterministic snapshots
//! (spec §9 — required for routing determinism, property P4).

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Immutable hardware snapshot. Probing is best-effort: on any failure,
/// fields fall back to conservative defaults rather than propagating an
/// error (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapability {
    pub cpu_cores: u32,
    pub cpu_percent: f32,
    pub ram_total_gb: f64,
    pub ram_available_gb: f64,
    pub vram_total_gb: f64,
    pub vram_available_gb: f64,
    pub has_gpu: bool,
    pub battery_percent: Option<f32>,
    pub is_metered: bool,
    pub thermal_throttling: bool,
}

impl DeviceCapability {
    /// Conservative fallback used when probing fails entirely.
    pub fn conservative_default() -> Self {
        Self {
            cpu_cores: 1,
            cpu_percent: 0.0,
            ram_total_gb: 0.0,
            ram_available_gb: 0.0,
            vram_total_gb: 0.0,
            vram_available_gb: 0.0,
            has_gpu: false,
            battery_percent: None,
            is_metered: false,
            thermal_throttling: false,
        }
    }
}

/// A single operation: take a hardware snapshot. Never fails.
pub trait DeviceProbe: Send + Sync {
    fn snapshot(&self) -> DeviceCapability;
}

/// Real, OS-backed probe. We have no portable VRAM/GPU-presence query
/// without a vendor SDK (CUDA/Metal), so `has_gpu`/`vram_*` are left at the
/// conservative "no GPU" default here — a deployment with GPU-aware
/// telemetry would supply its own `DeviceProbe` impl instead.
pub struct SystemDeviceProbe;

impl DeviceProbe for SystemDeviceProbe {
    fn snapshot(&self) -> DeviceCapability {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();

        let cpu_cores = sys.cpus().len().max(1) as u32;
        let cpu_percent = if sys.cpus().is_empty() {
            0.0
        } else {
            sys.cpus().iter().map(|c| c.cpu_usage()).sum::<f32>() / sys.cpus().len() as f32
        };

        let ram_total_gb = sys.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0;
        let ram_available_gb = sys.available_memory() as f64 / 1024.0 / 1024.0 / 1024.0;

        DeviceCapability {
            cpu_cores,
            cpu_percent,
            ram_total_gb,
            ram_available_gb,
            vram_total_gb: 0.0,
            vram_available_gb: 0.0,
            has_gpu: false,
            battery_percent: None,
            is_metered: false,
            thermal_throttling: false,
        }
    }
}

/// Fixed snapshot for deterministic tests.
pub struct StaticDeviceProbe(pub DeviceCapability);

impl DeviceProbe for StaticDeviceProbe {
    fn snapshot(&self) -> DeviceCapability {
        self.0
    }
}
