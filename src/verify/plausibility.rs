//! Plausibility Checker (spec §4.6 step 3).
//!
//! Ported from the original's `PlausibilityChecker`: numeric-domain range
//! checks, hallucination-marker matching, repetition detection, and
//! code-safety pattern scanning, fused into a single clamped confidence
//! delta.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("plausibility pattern is valid regex")
}

struct NumericDomain {
    name: &'static str,
    min: f64,
    max: f64,
}

static NUMERIC_DOMAINS: &[NumericDomain] = &[
    NumericDomain { name: "temperature", min: -273.15, max: 1000.0 },
    NumericDomain { name: "percentage", min: 0.0, max: 100.0 },
    NumericDomain { name: "coordinates", min: -180.0, max: 180.0 },
    NumericDomain { name: "date_year", min: 1900.0, max: 2100.0 },
    NumericDomain { name: "currency", min: 0.0, max: 1e12 },
    NumericDomain { name: "probability", min: 0.0, max: 1.0 },
    NumericDomain { name: "file_size", min: 0.0, max: 1e12 },
    NumericDomain { name: "memory_mb", min: 0.0, max: 1e6 },
    NumericDomain { name: "latency_ms", min: 0.0, max: 60000.0 },
    NumericDomain { name: "accuracy", min: 0.0, max: 100.0 },
];

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(-?\d+\.?\d*)\s*(°[CFcfa-z]+|%|km|m|s|ms|°|USD|EUR|GBP|million|billion|trillion)?")
});

static HALLUCINATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"as an ai( language model)?"),
        re(r"my (knowledge|training cut-off|cutoff)"),
        re(r"i (cannot|don't|can't) (access|provide|verify)"),
        re(r"based on (my )?(training )?(data|knowledge)"),
        re(r"(sorry|apologies)(,| )?(but|to say)"),
        re(r"i (must|should) (inform|clarify|note)"),
        re(r"please note that"),
    ]
});

/// Spec §4.6 step 3's code-safety list, distinct from (but overlapping)
/// the security scanner's own pattern table — this one only feeds the
/// plausibility delta, not a full vulnerability report.
static CODE_SAFETY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r"import\s+os\b"),
        re(r"import\s+sys\b"),
        re(r"subprocess\."),
        re(r"os\.system"),
        re(r"os\.popen"),
        re(r"eval\s*\("),
        re(r"exec\s*\("),
        re(r"pickle\.loads"),
        re(r"yaml\.load\s*\("),
        re(r"__import__\s*\("),
    ]
});

const REPETITION_THRESHOLD: f64 = 0.3;
const REPETITION_MIN_WORDS: usize = 10;

/// One extracted `(value, unit)` pair and whether it fell inside at least
/// one domain's range.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericCheck {
    pub value: f64,
    pub unit: String,
    pub in_range: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlausibilityReport {
    pub is_plausible: bool,
    pub numeric_checks: Vec<NumericCheck>,
    pub hallucination_hits: Vec<String>,
    pub repetition_hits: Vec<(String, f64)>,
    pub code_safety_hits: Vec<String>,
    pub confidence_impact: f64,
}

/// Stateless; all pattern tables are static.
#[derive(Default)]
pub struct PlausibilityChecker;

impl PlausibilityChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, output: &str) -> PlausibilityReport {
        let numeric_checks = self.check_numeric_values(output);
        let hallucination_hits = self.check_hallucinations(output);
        let repetition_hits = self.check_repetition(output);
        let code_safety_hits = self.check_code_safety(output);

        let mut impact = 0.0;
        impact -= hallucination_hits.len() as f64 * 0.15;
        impact -= repetition_hits.len() as f64 * 0.1;
        impact -= code_safety_hits.len() as f64 * 0.2;
        // "Out-of-range hits subtract 0.1 in aggregate" (spec §4.6 step 3):
        // a single flat penalty if any number failed every domain, not one
        // penalty per offending number.
        if numeric_checks.iter().any(|c| !c.in_range) {
            impact -= 0.1;
        }

        let confidence_impact = impact.clamp(-0.5, 0.0);
        let is_plausible = confidence_impact > -0.3;

        PlausibilityReport {
            is_plausible,
            numeric_checks,
            hallucination_hits,
            repetition_hits,
            code_safety_hits,
            confidence_impact,
        }
    }

    /// Decision (DESIGN.md open question #3): a number is plausible if it
    /// fits *any* domain range — the original tests all domains without
    /// ANDing the results together, so "any membership suffices" matches its
    /// observable behavior.
    fn check_numeric_values(&self, output: &str) -> Vec<NumericCheck> {
        NUMBER_PATTERN
            .captures_iter(output)
            .filter_map(|caps| {
                let value: f64 = caps.get(1)?.as_str().parse().ok()?;
                let unit = caps.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
                let in_range = NUMERIC_DOMAINS.iter().any(|d| value >= d.min && value <= d.max);
                Some(NumericCheck { value, unit, in_range })
            })
            .collect()
    }

    fn check_hallucinations(&self, output: &str) -> Vec<String> {
        let lower = output.to_lowercase();
        HALLUCINATION_PATTERNS
            .iter()
            .filter(|pattern| pattern.is_match(&lower))
            .map(|pattern| pattern.as_str().to_string())
            .collect()
    }

    fn check_repetition(&self, output: &str) -> Vec<(String, f64)> {
        let words: Vec<&str> = output.split_whitespace().collect();
        if words.len() < REPETITION_MIN_WORDS {
            return Vec::new();
        }
        let total = words.len() as f64;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in &words {
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter_map(|(word, count)| {
                let ratio = count as f64 / total;
                (ratio > REPETITION_THRESHOLD).then_some((word, ratio))
            })
            .collect()
    }

    fn check_code_safety(&self, output: &str) -> Vec<String> {
        CODE_SAFETY_PATTERNS
            .iter()
            .filter(|pattern| pattern.is_match(output))
            .map(|pattern| pattern.as_str().to_string())
            .collect()
    }
}
