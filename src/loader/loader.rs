//! Progressive Model Loader (spec §4.5, §5): ties the registry, memory
//! manager, quantizer and usage predictor together into the load/unload
//! state machine, plus the background predictive preloader.
//!
//! Grounded on the original's `ProgressiveModelLoader.load_module` /
//! `unload_module` / `_free_memory_for_load` / `_start_predictive_preloader`.
//! The lock discipline differs from the Python by necessity: Rust can't hold
//! a mutex across a recursive dependency load without deadlocking a second
//! caller, so the state lock here is only ever held for short, synchronous
//! transitions (status flips, ledger bumps) and is released before any
//! dependency recursion, eviction, or quantization call.

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use chrono::Utc;

use crate::error::{AmaimaError, Result};
use crate::loader::memory::MemoryManager;
use crate::loader::predictor::UsagePredictor;
use crate::loader::quantizer::{NoopQuantizer, Precision, Quantizer};
use crate::loader::registry::ModuleRegistry;
use crate::loader::types::{LoadedModule, ModuleStatus};

/// Module types eligible for predictive preloading (spec §4.5.2): below the
/// pinned threshold, since pinned modules are already resident at startup.
const PRELOAD_PRIORITY_CEILING: i32 = 8;

struct State {
    modules: HashMap<String, LoadedModule>,
}

pub struct ProgressiveModelLoader {
    registry: ModuleRegistry,
    memory: MemoryManager,
    quantizer: Box<dyn Quantizer>,
    predictor: UsagePredictor,
    state: Mutex<State>,
    condvar: Condvar,
    preload_tx: Mutex<Option<mpsc::Sender<(String, Precision)>>>,
    preload_threshold: f64,
}

impl ProgressiveModelLoader {
    /// Builds the loader with the default module set and spawns its
    /// background preloader thread. Returned as an `Arc` since the preloader
    /// thread needs to call back into `load` for the lifetime of the loader.
    pub fn new(max_memory_mb: u32, baseline_mb: u32, quantization_enabled: bool, preload_threshold: f64) -> Arc<Self> {
        Self::with_registry(ModuleRegistry::with_defaults(), max_memory_mb, baseline_mb, quantization_enabled, preload_threshold)
    }

    pub fn with_registry(
        registry: ModuleRegistry,
        max_memory_mb: u32,
        baseline_mb: u32,
        quantization_enabled: bool,
        preload_threshold: f64,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::channel::<(String, Precision)>();
        let loader = Arc::new(Self {
            registry,
            memory: MemoryManager::new(max_memory_mb, baseline_mb),
            quantizer: Box::new(NoopQuantizer::new(quantization_enabled)),
            predictor: UsagePredictor::new(),
            state: Mutex::new(State { modules: HashMap::new() }),
            condvar: Condvar::new(),
            preload_tx: Mutex::new(Some(tx)),
            preload_threshold,
        });

        let worker = Arc::clone(&loader);
        thread::spawn(move || {
            for (name, precision) in rx {
                match worker.load(&name, true, Some(precision)) {
                    Ok(_) => tracing::debug!(module = %name, "predictive preload complete"),
                    Err(err) => tracing::warn!(module = %name, error = %err, "predictive preload failed"),
                }
            }
        });

        loader
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn predictor(&self) -> &UsagePredictor {
        &self.predictor
    }

    pub fn status_of(&self, name: &str) -> Option<ModuleStatus> {
        self.state.lock().unwrap().modules.get(name).map(|m| m.status)
    }

    pub fn snapshot(&self) -> Vec<LoadedModule> {
        self.state.lock().unwrap().modules.values().cloned().collect()
    }

    /// Load `name`, recursively loading its dependencies first. `background`
    /// loads still bump `usage_count`/`last_used` (spec §9 decision: the
    /// predictive preloader's loads count as real usage, same as the original).
    pub fn load(&self, name: &str, background: bool, precision: Option<Precision>) -> Result<LoadedModule> {
        let precision = precision.unwrap_or_default();

        loop {
            // Fast paths: Ready returns immediately, Loading waits for the
            // in-flight attempt to resolve, anything else falls through to
            // a fresh attempt.
            {
                let mut state = self.state.lock().unwrap();
                loop {
                    match state.modules.get(name).map(|m| m.status) {
                        Some(ModuleStatus::Ready) => {
                            let mut updated = state.modules.get(name).unwrap().clone();
                            updated.spec.usage_count += 1;
                            updated.spec.last_used = Some(Utc::now());
                            state.modules.insert(name.to_string(), updated.clone());
                            return Ok(updated);
                        }
                        Some(ModuleStatus::Loading) => {
                            state = self.condvar.wait(state).unwrap();
                            continue;
                        }
                        _ => break,
                    }
                }
                state.modules.remove(name);
            }

            let spec = self
                .registry
                .get(name)
                .ok_or_else(|| AmaimaError::UnknownModule(name.to_string()))?;

            if self.memory.pressure() > 0.9 {
                self.free_memory_for_load(spec.memory_requirement_mb);
            }

            if !self.memory.allocate(name, spec.memory_requirement_mb) {
                return Err(AmaimaError::OutOfMemory {
                    module: name.to_string(),
                    requested_mb: spec.memory_requirement_mb,
                });
            }

            {
                let mut state = self.state.lock().unwrap();
                match state.modules.get(name).map(|m| m.status) {
                    Some(ModuleStatus::Ready) | Some(ModuleStatus::Loading) => {
                        // Lost the race to a concurrent caller; drop our
                        // reservation and retry from the top.
                        self.memory.release(name);
                        continue;
                    }
                    _ => {
                        let mut entry = LoadedModule::not_loaded(spec.clone());
                        entry.status = ModuleStatus::Loading;
                        state.modules.insert(name.to_string(), entry);
                    }
                }
            }

            let result = self.load_dependencies_and_finish(name, &spec, background, precision);

            let mut state = self.state.lock().unwrap();
            match &result {
                Ok(loaded) => {
                    state.modules.insert(name.to_string(), loaded.clone());
                }
                Err(_) => {
                    self.memory.release(name);
                    state.modules.remove(name);
                }
            }
            self.condvar.notify_all();
            drop(state);

            return result;
        }
    }

    fn load_dependencies_and_finish(
        &self,
        name: &str,
        spec: &crate::loader::types::ModuleSpec,
        background: bool,
        precision: Precision,
    ) -> Result<LoadedModule> {
        for dep in &spec.dependencies {
            self.load(dep, background, Some(precision)).map_err(|_| AmaimaError::DependencyFailure {
                module: name.to_string(),
                dependency: dep.clone(),
            })?;
        }

        let model_path = if spec.quantization_supported && self.quantizer.supports(std::path::Path::new(&spec.model_path)) {
            let (path, _reduction) = self.quantizer.quantize(std::path::Path::new(&spec.model_path), precision, 0);
            path.to_string_lossy().into_owned()
        } else {
            spec.model_path.clone()
        };
        let _ = model_path;

        Ok(LoadedModule {
            spec: spec.clone(),
            status: ModuleStatus::Ready,
            load_time: Some(Utc::now()),
            memory_allocated_mb: spec.memory_requirement_mb,
            error_message: None,
        })
    }

    /// Refuses to unload pinned modules, modules still loading, or modules
    /// other loaded modules depend on (invariant I3).
    pub fn unload(&self, name: &str) -> bool {
        let mut state = self.state.lock().unwrap();

        let Some(entry) = state.modules.get(name) else {
            return false;
        };
        if entry.status == ModuleStatus::Loading || entry.spec.is_pinned() {
            return false;
        }
        let has_dependents = state
            .modules
            .values()
            .any(|m| m.spec.name != name && m.spec.dependencies.iter().any(|d| d == name));
        if has_dependents {
            return false;
        }

        if let Some(entry) = state.modules.get_mut(name) {
            entry.status = ModuleStatus::Unloading;
        }
        state.modules.remove(name);
        drop(state);
        self.memory.release(name);
        tracing::info!(module = name, "module unloaded");
        true
    }

    /// Evicts Ready, non-pinned modules oldest-used-first until `required_mb`
    /// is free or there's nothing left to evict.
    fn free_memory_for_load(&self, required_mb: u32) {
        let mut candidates: Vec<(String, i32, Option<chrono::DateTime<Utc>>)> = {
            let state = self.state.lock().unwrap();
            state
                .modules
                .values()
                .filter(|m| m.status == ModuleStatus::Ready && !m.spec.is_pinned())
                .map(|m| (m.spec.name.clone(), m.spec.priority, m.spec.last_used))
                .collect()
        };
        candidates.sort_by(|a, b| a.2.cmp(&b.2).then(a.1.cmp(&b.1)));

        for (name, _, _) in candidates {
            if self.memory.available() >= required_mb {
                break;
            }
            if self.unload(&name) {
                tracing::info!(module = %name, "evicted to free memory");
            }
        }
    }

    /// Enqueues predicted modules for background loading. Not
    /// deduplicated against the in-flight queue (spec §9): a module
    /// predicted twice before its preload completes is queued twice, same
    /// as the original, since the `load` fast path makes the second
    /// attempt a cheap no-op once the first lands.
    pub fn preload_for_query(&self, query: &str, file_types: Option<&[String]>) {
        let prediction = self.predictor.predict(query, file_types);
        let tx_guard = self.preload_tx.lock().unwrap();
        let Some(tx) = tx_guard.as_ref() else { return };

        for module_type in &prediction.modules {
            if prediction.confidence_for(*module_type) <= self.preload_threshold {
                continue;
            }
            for name in self.registry.names_of_type(*module_type) {
                let Some(spec) = self.registry.get(&name) else { continue };
                if spec.priority >= PRELOAD_PRIORITY_CEILING {
                    continue;
                }
                if self.status_of(&name) == Some(ModuleStatus::Ready) {
                    continue;
                }
                let _ = tx.send((name, Precision::default()));
            }
        }
    }

    /// Shuts down the background preloader thread by dropping its sender,
    /// letting the channel drain and the worker thread exit.
    pub fn shutdown_preloader(&self) {
        *self.preload_tx.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Arc<ProgressiveModelLoader> {
        ProgressiveModelLoader::new(2000, 0, true, 0.3)
    }

    #[test]
    fn loading_a_module_also_loads_its_dependency() {
        let loader = loader();
        let loaded = loader.load("vision-base", false, None).unwrap();
        assert_eq!(loaded.status, ModuleStatus::Ready);
        assert_eq!(loader.status_of("embedding-base"), Some(ModuleStatus::Ready));
    }

    #[test]
    fn unknown_module_is_an_error() {
        let loader = loader();
        assert!(matches!(loader.load("nonexistent", false, None), Err(AmaimaError::UnknownModule(_))));
    }

    #[test]
    fn pinned_module_cannot_be_unloaded() {
        let loader = loader();
        loader.load("embedding-base", false, None).unwrap();
        assert!(!loader.unload("embedding-base"));
    }

    #[test]
    fn module_with_dependents_cannot_be_unloaded() {
        let loader = loader();
        loader.load("vision-base", false, None).unwrap();
        assert!(!loader.unload("embedding-base"));
        assert!(loader.unload("vision-base"));
        assert!(loader.unload("embedding-base"));
    }

    #[test]
    fn out_of_memory_when_budget_too_small() {
        let loader = ProgressiveModelLoader::new(50, 0, true, 0.3);
        // security-base has no dependencies, so the failure surfaces directly
        // as OutOfMemory rather than being wrapped as a DependencyFailure.
        let result = loader.load("security-base", false, None);
        assert!(matches!(result, Err(AmaimaError::OutOfMemory { .. })));
    }

    #[test]
    fn eviction_frees_room_for_a_new_load() {
        // embedding(150) + vision(300) + code(220) + reasoning(250) = 920 of a
        // 950 budget pushes pressure past 0.9, forcing eviction of the
        // oldest-used evictable module (vision) to fit audio-base (180).
        let loader = ProgressiveModelLoader::new(950, 0, true, 0.3);
        loader.load("vision-base", false, None).unwrap();
        loader.load("code-base", false, None).unwrap();
        loader.load("reasoning-base", false, None).unwrap();
        let result = loader.load("audio-base", false, None);
        assert!(result.is_ok());
        assert_eq!(loader.status_of("embedding-base"), Some(ModuleStatus::Ready));
        assert_eq!(loader.status_of("vision-base"), None);
    }

    #[test]
    fn repeated_ready_load_bumps_usage_count() {
        let loader = loader();
        loader.load("embedding-base", false, None).unwrap();
        let second = loader.load("embedding-base", false, None).unwrap();
        assert_eq!(second.spec.usage_count, 1);
    }

    #[test]
    fn preload_for_query_does_not_panic_and_eventually_loads() {
        // reasoning-base (priority 7) is below the preload priority ceiling;
        // code-base and vision-base (priority 9, 8) are not preloaded, same
        // as the original's `priority < 8` filter.
        let loader = loader();
        loader.preload_for_query("please analyze and reason about this logically", None);
        std::thread::sleep(std::time::Duration::from_millis(200));
        assert_eq!(loader.status_of("reasoning-base"), Some(ModuleStatus::Ready));
    }
}
