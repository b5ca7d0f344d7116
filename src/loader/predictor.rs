//! Usage Predictor (spec §4.5.2): query -> likely module types, with
//! co-occurrence learning.
//!
//! Ported directly from the original's `UsagePredictor`: a fixed
//! keyword-per-type map, a file-extension floor, Jaccard-similarity history
//! matching, and a symmetric co-occurrence counter (spec §9: "write-heavy,
//! read-rare; a striped counter is acceptable" — a single mutex is plenty at
//! this call volume).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::loader::types::ModuleType;

const MAX_HISTORY: usize = 50;
const SIMILARITY_THRESHOLD: f64 = 0.5;
const SIMILARITY_BOOST: f64 = 0.2;
const EMIT_THRESHOLD: f64 = 0.3;

fn keyword_map() -> &'static [(ModuleType, &'static [&'static str])] {
    &[
        (ModuleType::Vision, &["image", "picture", "photo", "visual", "see", "detect", "recognize"]),
        (ModuleType::Code, &["code", "program", "function", "class", "debug", "implement", "python"]),
        (ModuleType::Audio, &["audio", "speech", "sound", "listen", "transcribe", "voice"]),
        (ModuleType::Reasoning, &["analyze", "reason", "solve", "prove", "logical", "think"]),
        (ModuleType::Embedding, &["embed", "vector", "similarity", "semantic", "search"]),
        (ModuleType::Security, &["security", "vulnerability", "threat", "attack", "protect"]),
    ]
}

fn file_type_module(ext: &str) -> Option<ModuleType> {
    match ext {
        ".py" => Some(ModuleType::Code),
        ".jpg" | ".png" => Some(ModuleType::Vision),
        ".mp3" | ".wav" => Some(ModuleType::Audio),
        ".txt" => Some(ModuleType::Embedding),
        _ => None,
    }
}

struct HistoryEntry {
    query_lower: String,
    modules: Vec<ModuleType>,
}

/// Output of [`UsagePredictor::predict`].
#[derive(Debug, Clone, Default)]
pub struct PredictionResult {
    pub modules: Vec<ModuleType>,
    pub confidence: HashMap<ModuleType, f64>,
}

impl PredictionResult {
    pub fn confidence_for(&self, module_type: ModuleType) -> f64 {
        self.confidence.get(&module_type).copied().unwrap_or(0.0)
    }
}

struct State {
    history: VecDeque<HistoryEntry>,
    affinity: HashMap<(ModuleType, ModuleType), u64>,
}

/// Scores module types for a query, remembers recent queries, and tracks
/// pairwise module co-occurrence.
pub struct UsagePredictor {
    state: Mutex<State>,
}

impl UsagePredictor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                history: VecDeque::new(),
                affinity: HashMap::new(),
            }),
        }
    }

    pub fn predict(&self, query: &str, file_types: Option<&[String]>) -> PredictionResult {
        let query_lower = query.to_lowercase();
        let mut scores: HashMap<ModuleType, f64> = HashMap::new();

        for (module_type, keywords) in keyword_map() {
            let hits = keywords.iter().filter(|kw| query_lower.contains(**kw)).count();
            let score = (hits as f64 / keywords.len() as f64).min(1.0);
            scores.insert(*module_type, score);
        }

        if let Some(types) = file_types {
            for ext in types {
                if let Some(module_type) = file_type_module(ext) {
                    let entry = scores.entry(module_type).or_insert(0.0);
                    *entry = entry.max(0.8);
                }
            }
        }

        let mut state = self.state.lock().unwrap();

        for entry in state.history.iter() {
            if jaccard_similarity(&query_lower, &entry.query_lower) > SIMILARITY_THRESHOLD {
                for module_type in &entry.modules {
                    let score = scores.entry(*module_type).or_insert(0.0);
                    *score = (*score + SIMILARITY_BOOST).min(1.0);
                }
            }
        }

        let mut ranked: Vec<(ModuleType, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let modules: Vec<ModuleType> = ranked
            .iter()
            .filter(|(_, score)| *score > EMIT_THRESHOLD)
            .map(|(module_type, _)| *module_type)
            .collect();
        let confidence: HashMap<ModuleType, f64> = ranked.into_iter().collect();

        state.history.push_back(HistoryEntry {
            query_lower,
            modules: modules.clone(),
        });
        if state.history.len() > MAX_HISTORY {
            state.history.pop_front();
        }

        update_affinity(&mut state.affinity, &modules);

        PredictionResult { modules, confidence }
    }

    pub fn affinity(&self, a: ModuleType, b: ModuleType) -> u64 {
        let state = self.state.lock().unwrap();
        state.affinity.get(&(a, b)).copied().unwrap_or(0)
    }
}

impl Default for UsagePredictor {
    fn default() -> Self {
        Self::new()
    }
}

fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let set_a: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let set_b: std::collections::HashSet<&str> = b.split_whitespace().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn update_affinity(affinity: &mut HashMap<(ModuleType, ModuleType), u64>, modules: &[ModuleType]) {
    for (i, a) in modules.iter().enumerate() {
        for b in &modules[i + 1..] {
            *affinity.entry((*a, *b)).or_insert(0) += 1;
            *affinity.entry((*b, *a)).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_query_predicts_code_module() {
        let predictor = UsagePredictor::new();
        let result = predictor.predict("debug this python function", None);
        assert!(result.modules.contains(&ModuleType::Code));
    }

    #[test]
    fn vision_file_type_floors_score() {
        let predictor = UsagePredictor::new();
        let result = predictor.predict("what do you think", Some(&[".jpg".to_string()]));
        assert!(result.confidence_for(ModuleType::Vision) >= 0.8);
    }

    #[test]
    fn unrelated_query_predicts_nothing() {
        let predictor = UsagePredictor::new();
        let result = predictor.predict("hello there friend", None);
        assert!(result.modules.is_empty());
    }

    #[test]
    fn similar_repeated_query_boosts_score() {
        let predictor = UsagePredictor::new();
        predictor.predict("debug this python function", None);
        let second = predictor.predict("debug this python function please", None);
        assert!(second.confidence_for(ModuleType::Code) > 0.3);
    }

    #[test]
    fn affinity_tracks_co_occurrence() {
        let predictor = UsagePredictor::new();
        predictor.predict("analyze and debug this python code function implement", None);
        let affinity = predictor.affinity(ModuleType::Code, ModuleType::Reasoning);
        assert!(affinity >= 1);
    }

    #[test]
    fn history_bounded_to_max() {
        let predictor = UsagePredictor::new();
        for i in 0..60 {
            predictor.predict(&format!("debug function number {i}"), None);
        }
        let state = predictor.state.lock().unwrap();
        assert_eq!(state.history.len(), MAX_HISTORY);
    }
}
