//! LLM Critic (spec §4.6 step 6).
//!
//! Lightweight heuristic critique of a text output: length extremes,
//! all-caps shouting, apologetic language, and double negatives. Ported
//! from the original's `LLMCritic`.

use std::sync::LazyLock;

use regex::Regex;

const BASELINE_CONFIDENCE: f64 = 0.7;

static DOUBLE_NEGATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(is|are|was|were)\s+(not|never|no)\s+\w+ing\b").unwrap());

#[derive(Debug, Clone)]
pub struct CritiqueResult {
    pub confidence: f64,
    pub adjustment: f64,
    pub issues: Vec<&'static str>,
}

/// Stateless beyond its configurable baseline.
pub struct LlmCritic {
    baseline_confidence: f64,
}

impl LlmCritic {
    pub fn new(baseline_confidence: f64) -> Self {
        Self { baseline_confidence }
    }

    pub fn baseline_confidence(&self) -> f64 {
        self.baseline_confidence
    }

    pub fn critique(&self, output: &str) -> CritiqueResult {
        let mut adjustment = 0.0;
        let mut issues = Vec::new();

        let length = output.chars().count();
        if length < 20 {
            adjustment -= 0.1;
            issues.push("Response too short");
        } else if length > 10000 {
            adjustment -= 0.05;
            issues.push("Response excessively long");
        }

        let has_letters = output.chars().any(|c| c.is_alphabetic());
        let all_caps = has_letters && output.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase());
        if all_caps {
            adjustment -= 0.1;
            issues.push("All caps detected - may indicate low quality");
        }

        let lower = output.to_lowercase();
        if lower.contains("sorry") || lower.contains("apologies") {
            adjustment -= 0.05;
            issues.push("Excessive apologetic language");
        }

        if DOUBLE_NEGATIVE.is_match(&lower) {
            adjustment -= 0.02;
            issues.push("Double negative detected");
        }

        CritiqueResult {
            confidence: self.baseline_confidence + adjustment,
            adjustment,
            issues,
        }
    }
}

impl Default for LlmCritic {
    fn default() -> Self {
        Self::new(BASELINE_CONFIDENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_response_penalized() {
        let critic = LlmCritic::default();
        let result = critic.critique("ok");
        assert!(result.adjustment < 0.0);
        assert!(result.issues.contains(&"Response too short"));
    }

    #[test]
    fn normal_response_unaffected() {
        let critic = LlmCritic::default();
        let result = critic.critique("This is a perfectly ordinary, reasonably sized response to a query.");
        assert_eq!(result.adjustment, 0.0);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn all_caps_penalized() {
        let critic = LlmCritic::default();
        let result = critic.critique("THIS IS SHOUTING AT YOU IN ALL CAPS RIGHT NOW");
        assert!(result.issues.contains(&"All caps detected - may indicate low quality"));
    }

    #[test]
    fn apologetic_language_penalized() {
        let critic = LlmCritic::default();
        let result = critic.critique("Sorry, I am not able to help with that particular request today.");
        assert!(result.issues.contains(&"Excessive apologetic language"));
    }
}
