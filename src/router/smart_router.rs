//! Smart Router (spec §4.4): fuses probes + analyzers into a `RoutingDecision`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::json;

use crate::observability::SecurityEventLog;
use crate::probes::{ConnectivityProbe, ConnectivityStatus, DeviceCapability, DeviceProbe};
use crate::router::complexity::ComplexityAnalyzer;
use crate::router::security::SecurityClassifier;
use crate::router::types::{ExecutionMode, ModelSize, QueryComplexity, RoutingDecision, SecurityLevel};

/// Tunables for the router. Mirrors the external-interface config table's
/// router-relevant fields.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub cache_ttl: Duration,
    pub history_ttl_days: i64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5),
            history_ttl_days: 30,
        }
    }
}

fn model_requirements(complexity: QueryComplexity) -> ModelSize {
    match complexity {
        QueryComplexity::Trivial => ModelSize::Nano1B,
        QueryComplexity::Simple => ModelSize::Small3B,
        QueryComplexity::Moderate => ModelSize::Medium7B,
        QueryComplexity::Complex => ModelSize::Large13B,
        QueryComplexity::Expert => ModelSize::XL34B,
    }
}

fn cost_per_model(size: ModelSize) -> Decimal {
    let rate = match size {
        ModelSize::Nano1B => 0.30,
        ModelSize::Small3B => 0.45,
        ModelSize::Medium7B => 0.60,
        ModelSize::Large13B => 0.90,
        ModelSize::XL34B => 1.20,
        ModelSize::Ultra200B => 1.50,
    };
    Decimal::from_f64(rate).expect("rate table values are finite")
}

fn latency_baseline(mode: ExecutionMode) -> (f64, f64) {
    match mode {
        ExecutionMode::OfflineLocal => (15.0, 0.5),
        ExecutionMode::HybridLocalFirst => (25.0, 0.8),
        ExecutionMode::HybridCloudFirst => (80.0, 1.5),
        ExecutionMode::CloudOnly => (120.0, 2.0),
    }
}

struct ProbeCache<T> {
    value: Option<(T, Instant)>,
}

impl<T: Copy> ProbeCache<T> {
    fn new() -> Self {
        Self { value: None }
    }

    fn get_or_refresh(&mut self, ttl: Duration, refresh: impl FnOnce() -> T) -> T {
        if let Some((value, taken_at)) = self.value {
            if taken_at.elapsed() < ttl {
                return value;
            }
        }
        let fresh = refresh();
        self.value = Some((fresh, Instant::now()));
        fresh
    }
}

/// Fuses device/connectivity probes, the complexity analyzer, and the
/// security classifier into routing decisions.
pub struct SmartRouter {
    config: RouterConfig,
    device_probe: Box<dyn DeviceProbe>,
    connectivity_probe: Box<dyn ConnectivityProbe>,
    device_cache: Mutex<ProbeCache<DeviceCapability>>,
    connectivity_cache: Mutex<ProbeCache<ConnectivityStatus>>,
    complexity_analyzer: ComplexityAnalyzer,
    security_classifier: SecurityClassifier,
    security_events: SecurityEventLog,
    requests_routed: AtomicUsize,
}

impl SmartRouter {
    pub fn new(
        config: RouterConfig,
        device_probe: Box<dyn DeviceProbe>,
        connectivity_probe: Box<dyn ConnectivityProbe>,
    ) -> Self {
        let history_ttl_days = config.history_ttl_days;
        Self {
            config,
            device_probe,
            connectivity_probe,
            device_cache: Mutex::new(ProbeCache::new()),
            connectivity_cache: Mutex::new(ProbeCache::new()),
            complexity_analyzer: ComplexityAnalyzer::new(history_ttl_days),
            security_classifier: SecurityClassifier::new(),
            security_events: SecurityEventLog::new(),
            requests_routed: AtomicUsize::new(0),
        }
    }

    pub fn requests_routed(&self) -> usize {
        self.requests_routed.load(Ordering::Relaxed)
    }

    pub fn security_events(&self) -> &SecurityEventLog {
        &self.security_events
    }

    fn device_snapshot(&self) -> DeviceCapability {
        self.device_cache
            .lock()
            .unwrap()
            .get_or_refresh(self.config.cache_ttl, || self.device_probe.snapshot())
    }

    fn connectivity_snapshot(&self) -> ConnectivityStatus {
        self.connectivity_cache
            .lock()
            .unwrap()
            .get_or_refresh(self.config.cache_ttl, || self.connectivity_probe.snapshot())
    }

    /// `route` is synchronous, non-blocking beyond cached probes, and
    /// infallible by construction (spec §5, §7).
    pub fn route(
        &self,
        query: &str,
        operation: &str,
        user_preference: Option<ExecutionMode>,
    ) -> RoutingDecision {
        let device = self.device_snapshot();
        let connectivity = self.connectivity_snapshot();
        let complexity_result = self.complexity_analyzer.analyze(query);
        let security_level =
            self.security_classifier
                .classify(operation, query, &self.security_events);

        let (execution_mode, preference_source) = match user_preference {
            Some(mode) => (mode, true),
            None => (
                self.determine_execution_mode(&device, &connectivity, complexity_result.complexity, security_level),
                false,
            ),
        };

        let model_size = self.select_model(&device, complexity_result.complexity, security_level);
        let fallback_chain = self.build_fallback_chain(execution_mode, connectivity.is_available);

        let word_count = query.split_whitespace().count() as f64;
        let token_count = word_count * 1.3;
        let estimated_latency_ms =
            self.estimate_latency(execution_mode, token_count, complexity_result.complexity);
        let estimated_cost = self.estimate_cost(model_size, token_count);

        let mut reasoning = HashMap::new();
        reasoning.insert(
            "complexity_level".to_string(),
            json!(complexity_result.complexity.as_str()),
        );
        reasoning.insert("device_has_gpu".to_string(), json!(device.has_gpu));
        reasoning.insert(
            "device_ram_gb".to_string(),
            json!(device.ram_available_gb.round()),
        );
        reasoning.insert(
            "network_available".to_string(),
            json!(connectivity.is_available),
        );
        reasoning.insert(
            "latency_ms".to_string(),
            json!(estimated_latency_ms.round()),
        );
        reasoning.insert("security_level".to_string(), json!(security_level.as_str()));
        reasoning.insert("battery_percent".to_string(), json!(device.battery_percent));
        reasoning.insert("is_metered".to_string(), json!(device.is_metered));
        if preference_source {
            reasoning.insert("source".to_string(), json!("user_preference"));
        }

        self.requests_routed.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            query_len = query.len(),
            complexity = complexity_result.complexity.as_str(),
            execution_mode = execution_mode.as_str(),
            model_size = model_size.as_str(),
            security_level = security_level.as_str(),
            "routed query"
        );

        RoutingDecision {
            execution_mode,
            model_size,
            complexity: complexity_result.complexity,
            security_level,
            confidence: complexity_result.confidence,
            estimated_latency_ms,
            estimated_cost,
            fallback_chain,
            reasoning,
            timestamp: Utc::now(),
        }
    }

    fn determine_execution_mode(
        &self,
        device: &DeviceCapability,
        connectivity: &ConnectivityStatus,
        complexity: QueryComplexity,
        security: SecurityLevel,
    ) -> ExecutionMode {
        if !connectivity.is_available {
            return ExecutionMode::OfflineLocal;
        }
        if let Some(battery) = device.battery_percent {
            if battery < 20.0 {
                return ExecutionMode::HybridLocalFirst;
            }
        }
        if device.is_metered {
            return ExecutionMode::HybridLocalFirst;
        }
        if security == SecurityLevel::Critical && !device.has_gpu {
            return ExecutionMode::CloudOnly;
        }
        if complexity == QueryComplexity::Expert
            && (device.ram_available_gb < 26.0 || !device.has_gpu)
        {
            return ExecutionMode::CloudOnly;
        }
        if complexity == QueryComplexity::Expert {
            return ExecutionMode::HybridLocalFirst;
        }
        ExecutionMode::HybridLocalFirst
    }

    fn select_model(
        &self,
        device: &DeviceCapability,
        complexity: QueryComplexity,
        security: SecurityLevel,
    ) -> ModelSize {
        let base = model_requirements(complexity);

        if security == SecurityLevel::Critical && device.ram_available_gb >= 68.0 {
            return ModelSize::XL34B;
        }

        if device.ram_available_gb < base.ram_gb() {
            return largest_fitting(device.ram_available_gb, &ModelSize::ALL).unwrap_or(ModelSize::Nano1B);
        }

        if device.has_gpu && device.vram_available_gb >= base.vram_gb() {
            return base;
        }

        if !device.has_gpu && base.vram_gb() > 0.0 {
            let candidates = [ModelSize::Nano1B, ModelSize::Small3B, ModelSize::Medium7B];
            return largest_fitting(device.ram_available_gb, &candidates).unwrap_or(ModelSize::Nano1B);
        }

        base
    }

    fn build_fallback_chain(&self, primary: ExecutionMode, online: bool) -> Vec<ExecutionMode> {
        match primary {
            ExecutionMode::CloudOnly if online => {
                vec![ExecutionMode::HybridCloudFirst, ExecutionMode::HybridLocalFirst]
            }
            ExecutionMode::CloudOnly => vec![ExecutionMode::OfflineLocal],
            ExecutionMode::HybridCloudFirst => {
                vec![ExecutionMode::HybridLocalFirst, ExecutionMode::OfflineLocal]
            }
            ExecutionMode::HybridLocalFirst => vec![ExecutionMode::OfflineLocal],
            ExecutionMode::OfflineLocal => vec![ExecutionMode::OfflineLocal],
        }
    }

    fn estimate_latency(&self, mode: ExecutionMode, token_count: f64, complexity: QueryComplexity) -> f64 {
        let (baseline, per_token) = latency_baseline(mode);
        baseline + token_count * per_token * (1.0 + 0.2 * (complexity as i32 as f64 - 1.0))
    }

    fn estimate_cost(&self, size: ModelSize, token_count: f64) -> Decimal {
        let rate = cost_per_model(size);
        let tokens = Decimal::from_f64(token_count / 1000.0).expect("token_count is finite");
        rate * tokens
    }
}

/// Largest model in `candidates` whose ram_gb fits within `ram_available_gb`.
fn largest_fitting(ram_available_gb: f64, candidates: &[ModelSize]) -> Option<ModelSize> {
    candidates
        .iter()
        .copied()
        .filter(|size| size.ram_gb() <= ram_available_gb)
        .max_by(|a, b| a.ram_gb().total_cmp(&b.ram_gb()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::{ConnectionType, StaticConnectivityProbe, StaticDeviceProbe};

    fn router_with(device: DeviceCapability, connectivity: ConnectivityStatus) -> SmartRouter {
        SmartRouter::new(
            RouterConfig::default(),
            Box::new(StaticDeviceProbe(device)),
            Box::new(StaticConnectivityProbe(connectivity)),
        )
    }

    fn offline() -> ConnectivityStatus {
        ConnectivityStatus::conservative_default()
    }

    fn online() -> ConnectivityStatus {
        ConnectivityStatus {
            is_available: true,
            connection_type: ConnectionType::Wifi,
            latency_ms: 20.0,
            bandwidth_mbps: 100.0,
            last_check: Utc::now(),
        }
    }

    #[test]
    fn scenario_trivial_offline_query() {
        let device = DeviceCapability {
            has_gpu: false,
            ram_available_gb: 4.0,
            ..DeviceCapability::conservative_default()
        };
        let router = router_with(device, offline());
        let decision = router.route("what is http", "general", None);

        assert_eq!(decision.execution_mode, ExecutionMode::OfflineLocal);
        assert_eq!(decision.complexity, QueryComplexity::Trivial);
        assert_eq!(decision.model_size, ModelSize::Nano1B);
        assert_eq!(decision.fallback_chain, vec![ExecutionMode::OfflineLocal]);
    }

    #[test]
    fn scenario_expert_online_query_on_weak_box() {
        let device = DeviceCapability {
            has_gpu: false,
            ram_available_gb: 8.0,
            ..DeviceCapability::conservative_default()
        };
        let router = router_with(device, online());
        let decision = router.route(
            "prove that every bounded sequence has a convergent subsequence",
            "general",
            None,
        );

        assert_eq!(decision.complexity, QueryComplexity::Expert);
        assert_eq!(decision.execution_mode, ExecutionMode::CloudOnly);
        assert_eq!(
            decision.fallback_chain,
            vec![ExecutionMode::HybridCloudFirst, ExecutionMode::HybridLocalFirst]
        );
    }

    #[test]
    fn scenario_critical_security_with_gpu() {
        let device = DeviceCapability {
            has_gpu: true,
            ram_available_gb: 80.0,
            vram_available_gb: 20.0,
            ..DeviceCapability::conservative_default()
        };
        let router = router_with(device, online());
        let decision = router.route("please rm -rf / now", "code_generation", None);

        assert_eq!(decision.security_level, SecurityLevel::Critical);
        assert_eq!(decision.execution_mode, ExecutionMode::HybridLocalFirst);
        assert_eq!(decision.model_size, ModelSize::XL34B);
    }

    #[test]
    fn user_preference_is_honored_verbatim() {
        let device = DeviceCapability {
            has_gpu: false,
            ram_available_gb: 4.0,
            ..DeviceCapability::conservative_default()
        };
        let router = router_with(device, online());
        let decision = router.route(
            "what is http",
            "general",
            Some(ExecutionMode::HybridCloudFirst),
        );

        assert_eq!(decision.execution_mode, ExecutionMode::HybridCloudFirst);
        assert_eq!(
            decision.reasoning.get("source").and_then(|v| v.as_str()),
            Some("user_preference")
        );
    }

    #[test]
    fn low_battery_forces_hybrid_local_first() {
        let device = DeviceCapability {
            battery_percent: Some(15.0),
            ..DeviceCapability::conservative_default()
        };
        let router = router_with(device, online());
        let decision = router.route("summarize this document", "general", None);
        assert_eq!(decision.execution_mode, ExecutionMode::HybridLocalFirst);
    }

    #[test]
    fn requests_routed_increments() {
        let router = router_with(DeviceCapability::conservative_default(), online());
        router.route("what is http", "general", None);
        router.route("what is http", "general", None);
        assert_eq!(router.requests_routed(), 2);
    }
}
