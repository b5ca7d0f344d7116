//! Memory Manager (spec §4.5.1): reservation ledger, pressure, allocate/release.
//!
//! A single mutex guards the ledger; every operation here is an O(1)
//! critical section, matching the teacher's `Mutex<HashMap<...>>` discipline
//! in `llm/router.rs` (`session_pins`, `cooldowns`).

use std::collections::HashMap;
use std::sync::Mutex;

struct Ledger {
    reserved_mb: HashMap<String, u32>,
}

/// Tracks per-module memory reservations against a fixed budget. No
/// over-subscription: `allocate` only succeeds if the request fits in
/// what's currently available (invariant I1).
pub struct MemoryManager {
    max_memory_mb: u32,
    baseline_mb: u32,
    ledger: Mutex<Ledger>,
}

impl MemoryManager {
    pub fn new(max_memory_mb: u32, baseline_mb: u32) -> Self {
        Self {
            max_memory_mb,
            baseline_mb,
            ledger: Mutex::new(Ledger {
                reserved_mb: HashMap::new(),
            }),
        }
    }

    pub fn available(&self) -> u32 {
        let ledger = self.ledger.lock().unwrap();
        let used: u32 = ledger.reserved_mb.values().sum::<u32>() + self.baseline_mb;
        self.max_memory_mb.saturating_sub(used)
    }

    /// Attempt to reserve `size_mb` for `name`. Returns `false` without
    /// mutating the ledger if it would not fit.
    pub fn allocate(&self, name: &str, size_mb: u32) -> bool {
        let mut ledger = self.ledger.lock().unwrap();
        let used: u32 = ledger.reserved_mb.values().sum::<u32>() + self.baseline_mb;
        let available = self.max_memory_mb.saturating_sub(used);
        if size_mb > available {
            tracing::warn!(module = name, size_mb, available, "memory allocation failed");
            return false;
        }
        ledger.reserved_mb.insert(name.to_string(), size_mb);
        tracing::debug!(module = name, size_mb, "memory reserved");
        true
    }

    pub fn release(&self, name: &str) {
        let mut ledger = self.ledger.lock().unwrap();
        if ledger.reserved_mb.remove(name).is_some() {
            tracing::debug!(module = name, "memory released");
        }
    }

    /// Fraction of `max_memory_mb` currently reserved including baseline
    /// overhead, clamped to 1.0.
    pub fn pressure(&self) -> f64 {
        let ledger = self.ledger.lock().unwrap();
        let used: u32 = ledger.reserved_mb.values().sum::<u32>() + self.baseline_mb;
        (used as f64 / self.max_memory_mb as f64).min(1.0)
    }

    pub fn reserved_for(&self, name: &str) -> Option<u32> {
        self.ledger.lock().unwrap().reserved_mb.get(name).copied()
    }

    pub fn total_reserved(&self) -> u32 {
        self.ledger.lock().unwrap().reserved_mb.values().sum()
    }

    pub fn max_memory_mb(&self) -> u32 {
        self.max_memory_mb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_succeeds_within_budget() {
        let mgr = MemoryManager::new(1000, 200);
        assert!(mgr.allocate("a", 300));
        assert_eq!(mgr.available(), 500);
    }

    #[test]
    fn allocate_fails_over_budget() {
        let mgr = MemoryManager::new(1000, 200);
        assert!(mgr.allocate("a", 700));
        assert!(!mgr.allocate("b", 200));
        assert_eq!(mgr.available(), 100);
    }

    #[test]
    fn release_frees_reservation() {
        let mgr = MemoryManager::new(1000, 200);
        mgr.allocate("a", 300);
        mgr.release("a");
        assert_eq!(mgr.available(), 800);
        assert!(mgr.reserved_for("a").is_none());
    }

    #[test]
    fn pressure_reflects_usage() {
        let mgr = MemoryManager::new(1000, 0);
        mgr.allocate("a", 500);
        assert_eq!(mgr.pressure(), 0.5);
    }

    #[test]
    fn pressure_clamped_to_one() {
        let mgr = MemoryManager::new(100, 200);
        assert_eq!(mgr.pressure(), 1.0);
    }

    #[test]
    fn invariant_never_oversubscribes() {
        let mgr = MemoryManager::new(1000, 0);
        for i in 0..20 {
            mgr.allocate(&format!("m{i}"), 100);
        }
        assert!(mgr.total_reserved() <= mgr.max_memory_mb());
    }
}
