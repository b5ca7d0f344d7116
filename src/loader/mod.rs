//! Progressive model loading: registry, memory budget, usage prediction,
//! quantization, and the loader that ties them together (spec §4.5).

pub mod loader;
pub mod memory;
pub mod predictor;
pub mod quantizer;
pub mod registry;
pub mod types;

pub use loader::ProgressiveModelLoader;
pub use memory::MemoryManager;
pub use predictor::{PredictionResult, UsagePredictor};
pub use quantizer::{NoopQuantizer, Precision, Quantizer};
pub use registry::ModuleRegistry;
pub use types::{LoadedModule, ModuleSpec, ModuleStatus, ModuleType, PINNED_PRIORITY};
