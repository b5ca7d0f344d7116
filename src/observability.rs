//! Metrics façade and security event log.
//!
//! Exposition is pluggable (spec §6): `MetricsRecorder` is the seam an
//! external sink (Prometheus, OpenTelemetry, ...) would implement. The
//! bundled `InMemoryMetrics` is enough for tests and for a caller that only
//! wants in-process counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::router::types::SecurityLevel;

/// Counters, histograms, and gauges for the core's observable operations.
/// Histogram methods receive raw samples; a real sink would bucket them.
pub trait MetricsRecorder: Send + Sync {
    fn record_query(&self, complexity: &str, mode: &str, status: &str, latency_ms: f64);
    fn record_model_load(&self, model_name: &str, status: &str, latency_ms: f64);
    fn record_verification(&self, level: &str, confidence: f64);
    fn record_routing_decision(&self, complexity: &str, model_size: &str, execution_mode: &str);
    fn record_error(&self, component: &str, error_type: &str);
    fn set_memory_usage_mb(&self, component: &str, mb: f64);
}

/// In-memory counters, sufficient as the default recorder and as a test
/// double that can be inspected after the fact.
#[derive(Default)]
pub struct InMemoryMetrics {
    queries_total: AtomicU64,
    model_loads_total: AtomicU64,
    errors_total: AtomicU64,
    routing_decisions_total: AtomicU64,
    memory_gauges: Mutex<std::collections::HashMap<String, f64>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queries_total(&self) -> u64 {
        self.queries_total.load(Ordering::Relaxed)
    }

    pub fn model_loads_total(&self) -> u64 {
        self.model_loads_total.load(Ordering::Relaxed)
    }

    pub fn errors_total(&self) -> u64 {
        self.errors_total.load(Ordering::Relaxed)
    }

    pub fn memory_usage_mb(&self, component: &str) -> Option<f64> {
        self.memory_gauges.lock().unwrap().get(component).copied()
    }
}

impl MetricsRecorder for InMemoryMetrics {
    fn record_query(&self, complexity: &str, mode: &str, status: &str, latency_ms: f64) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(complexity, mode, status, latency_ms, "query recorded");
    }

    fn record_model_load(&self, model_name: &str, status: &str, latency_ms: f64) {
        self.model_loads_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(model_name, status, latency_ms, "model load recorded");
    }

    fn record_verification(&self, level: &str, confidence: f64) {
        tracing::debug!(level, confidence, "verification recorded");
    }

    fn record_routing_decision(&self, complexity: &str, model_size: &str, execution_mode: &str) {
        self.routing_decisions_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(complexity, model_size, execution_mode, "routing decision recorded");
    }

    fn record_error(&self, component: &str, error_type: &str) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(component, error_type, "error recorded");
    }

    fn set_memory_usage_mb(&self, component: &str, mb: f64) {
        self.memory_gauges
            .lock()
            .unwrap()
            .insert(component.to_string(), mb);
    }
}

/// A single entry in the security classifier's process-local event log
/// (spec §4.3: "every non-Standard hit is logged to an event list").
#[derive(Debug, Clone)]
pub struct SecurityEvent {
    pub level: SecurityLevel,
    pub matched_pattern: String,
    pub query_excerpt: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, mutex-guarded event log. Never held across I/O.
#[derive(Default)]
pub struct SecurityEventLog {
    events: Mutex<Vec<SecurityEvent>>,
}

impl SecurityEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, level: SecurityLevel, matched_pattern: impl Into<String>, query: &str) {
        let excerpt: String = query.chars().take(80).collect();
        self.events.lock().unwrap().push(SecurityEvent {
            level,
            matched_pattern: matched_pattern.into(),
            query_excerpt: excerpt,
            timestamp: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<SecurityEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_metrics_count() {
        let metrics = InMemoryMetrics::new();
        metrics.record_query("trivial", "offline_local", "ok", 12.0);
        metrics.record_query("expert", "cloud_only", "ok", 400.0);
        assert_eq!(metrics.queries_total(), 2);
    }

    #[test]
    fn security_event_log_records_excerpt() {
        let log = SecurityEventLog::new();
        log.record(SecurityLevel::Critical, "rm -rf", "please rm -rf / now");
        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot()[0].level, SecurityLevel::Critical);
    }
}
