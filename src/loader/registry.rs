//! Module Registry (spec §4.5.3, §2 "Module Registry + Loader").
//!
//! Holds `ModuleSpec`s by name. Ported verbatim from the original's
//! `_register_default_modules()`: six default specs with their exact
//! priority/size/memory/dependency/quantization values.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::loader::types::{ModuleSpec, ModuleType};

fn default_modules() -> Vec<ModuleSpec> {
    vec![
        ModuleSpec {
            name: "embedding-base".to_string(),
            module_type: ModuleType::Embedding,
            version: "1.0.0".to_string(),
            priority: 10,
            size_mb: 120,
            memory_requirement_mb: 150,
            dependencies: vec![],
            capabilities: vec!["embed_text".to_string(), "embed_code".to_string()],
            quantization_supported: true,
            model_path: "/models/embedding-base".to_string(),
            tokenizer_path: Some("/models/embedding-base-tokenizer".to_string()),
            usage_count: 0,
            last_used: None,
        },
        ModuleSpec {
            name: "vision-base".to_string(),
            module_type: ModuleType::Vision,
            version: "1.0.0".to_string(),
            priority: 8,
            size_mb: 250,
            memory_requirement_mb: 300,
            dependencies: vec!["embedding-base".to_string()],
            capabilities: vec!["image_classification".to_string(), "object_detection".to_string()],
            quantization_supported: true,
            model_path: "/models/vision-base".to_string(),
            tokenizer_path: None,
            usage_count: 0,
            last_used: None,
        },
        ModuleSpec {
            name: "code-base".to_string(),
            module_type: ModuleType::Code,
            version: "1.0.0".to_string(),
            priority: 9,
            size_mb: 180,
            memory_requirement_mb: 220,
            dependencies: vec!["embedding-base".to_string()],
            capabilities: vec![
                "code_generation".to_string(),
                "code_completion".to_string(),
                "code_analysis".to_string(),
            ],
            quantization_supported: true,
            model_path: "/models/code-base".to_string(),
            tokenizer_path: Some("/models/code-base-tokenizer".to_string()),
            usage_count: 0,
            last_used: None,
        },
        ModuleSpec {
            name: "reasoning-base".to_string(),
            module_type: ModuleType::Reasoning,
            version: "1.0.0".to_string(),
            priority: 7,
            size_mb: 200,
            memory_requirement_mb: 250,
            dependencies: vec!["embedding-base".to_string()],
            capabilities: vec!["logical_reasoning".to_string(), "math_solving".to_string()],
            quantization_supported: true,
            model_path: "/models/reasoning-base".to_string(),
            tokenizer_path: Some("/models/reasoning-base-tokenizer".to_string()),
            usage_count: 0,
            last_used: None,
        },
        ModuleSpec {
            name: "audio-base".to_string(),
            module_type: ModuleType::Audio,
            version: "1.0.0".to_string(),
            priority: 6,
            size_mb: 150,
            memory_requirement_mb: 180,
            dependencies: vec!["embedding-base".to_string()],
            capabilities: vec!["speech_recognition".to_string(), "audio_classification".to_string()],
            quantization_supported: true,
            model_path: "/models/audio-base".to_string(),
            tokenizer_path: Some("/models/audio-base-tokenizer".to_string()),
            usage_count: 0,
            last_used: None,
        },
        ModuleSpec {
            name: "security-base".to_string(),
            module_type: ModuleType::Security,
            version: "1.0.0".to_string(),
            priority: 5,
            size_mb: 100,
            memory_requirement_mb: 120,
            dependencies: vec![],
            capabilities: vec!["vulnerability_scan".to_string(), "threat_detection".to_string()],
            quantization_supported: false,
            model_path: "/models/security-base".to_string(),
            tokenizer_path: None,
            usage_count: 0,
            last_used: None,
        },
    ]
}

/// Mutex-guarded map of registered module specs. The loader clones specs
/// out of here when it creates a `LoadedModule`; the registry itself is
/// never mutated by anything but `register`.
pub struct ModuleRegistry {
    specs: Mutex<HashMap<String, ModuleSpec>>,
}

impl ModuleRegistry {
    /// An empty registry, for tests that want full control over the spec set.
    pub fn empty() -> Self {
        Self {
            specs: Mutex::new(HashMap::new()),
        }
    }

    /// The registry pre-populated with the six default module specs.
    pub fn with_defaults() -> Self {
        let registry = Self::empty();
        for spec in default_modules() {
            registry.register(spec);
        }
        registry
    }

    pub fn register(&self, spec: ModuleSpec) {
        let name = spec.name.clone();
        self.specs.lock().unwrap().insert(name.clone(), spec);
        tracing::info!(module = name, "registered module");
    }

    pub fn get(&self, name: &str) -> Option<ModuleSpec> {
        self.specs.lock().unwrap().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.lock().unwrap().contains_key(name)
    }

    pub fn names_of_type(&self, module_type: ModuleType) -> Vec<String> {
        self.specs
            .lock()
            .unwrap()
            .values()
            .filter(|spec| spec.module_type == module_type)
            .map(|spec| spec.name.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<ModuleSpec> {
        self.specs.lock().unwrap().values().cloned().collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_six_modules() {
        let registry = ModuleRegistry::with_defaults();
        assert_eq!(registry.all().len(), 6);
    }

    #[test]
    fn embedding_base_is_pinned() {
        let registry = ModuleRegistry::with_defaults();
        let spec = registry.get("embedding-base").unwrap();
        assert!(spec.is_pinned());
    }

    #[test]
    fn vision_base_depends_on_embedding() {
        let registry = ModuleRegistry::with_defaults();
        let spec = registry.get("vision-base").unwrap();
        assert_eq!(spec.dependencies, vec!["embedding-base".to_string()]);
    }

    #[test]
    fn unknown_module_absent() {
        let registry = ModuleRegistry::with_defaults();
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn security_base_not_quantization_supported() {
        let registry = ModuleRegistry::with_defaults();
        let spec = registry.get("security-base").unwrap();
        assert!(!spec.quantization_supported);
    }
}
