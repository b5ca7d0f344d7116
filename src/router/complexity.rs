//! Complexity Analyzer (spec §4.2).
//!
//! Maps query text to a `(tier, confidence)` pair using an ordered regex
//! catalog, a length-based adjustment, and a digest-keyed history cache.

use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::router::types::QueryComplexity;

const MAX_HISTORY: usize = 1000;
const EVICT_ON_OVERFLOW: usize = 100;

/// One regex family assigned to a complexity tier. Scanned highest tier
/// first; first family with any hit wins (spec §4.2 step 3).
struct TierPatterns {
    tier: QueryComplexity,
    patterns: Vec<Regex>,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("complexity pattern is valid regex")
}

static CATALOG: LazyLock<Vec<TierPatterns>> = LazyLock::new(|| {
    vec![
        TierPatterns {
            tier: QueryComplexity::Expert,
            patterns: vec![
                re(r"\bprove\b"),
                re(r"\bderive\b"),
                re(r"given the following\b"),
                re(r"develop (a )?novel\b"),
            ],
        },
        TierPatterns {
            tier: QueryComplexity::Complex,
            patterns: vec![
                re(r"design\s+(a\s+)?(system|architecture|protocol)"),
                re(r"compare\s+(and\s+contrast|vs\.?)\s+"),
                re(r"optimize\s+(for|performance|scalability)"),
                re(r"explain\s+(the\s+)?(relationship|difference)\s+between"),
            ],
        },
        TierPatterns {
            tier: QueryComplexity::Moderate,
            patterns: vec![
                re(r"\banalyze\b"),
                re(r"\bevaluate\b"),
                re(r"why does\b"),
                re(r"how to\b"),
                re(r"\bimplement\b"),
            ],
        },
        TierPatterns {
            tier: QueryComplexity::Simple,
            patterns: vec![
                re(r"\bexplain\b"),
                re(r"\bdescribe\b"),
                re(r"\bcompare\b"),
                re(r"\bsummarize\b"),
            ],
        },
        TierPatterns {
            tier: QueryComplexity::Trivial,
            patterns: vec![
                re(r"^(what|who|when|where|how)\s+(is|are|do|does)\s+"),
                re(r"^define\s+"),
                re(r"^[a-z]+\s+means?\s*"),
            ],
        },
    ]
});

struct HistoryEntry {
    tier: QueryComplexity,
    inserted_at: DateTime<Utc>,
}

/// Bounded, digest-keyed history cache plus the regex catalog scan.
pub struct ComplexityAnalyzer {
    history: Mutex<HashMap<String, HistoryEntry>>,
    insertion_order: Mutex<VecDeque<String>>,
    history_ttl: ChronoDuration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityResult {
    pub complexity: QueryComplexity,
    pub confidence: f64,
}

impl ComplexityAnalyzer {
    pub fn new(history_ttl_days: i64) -> Self {
        Self {
            history: Mutex::new(HashMap::new()),
            insertion_order: Mutex::new(VecDeque::new()),
            history_ttl: ChronoDuration::days(history_ttl_days),
        }
    }

    pub fn analyze(&self, query: &str) -> ComplexityResult {
        let normalized = query.trim().to_lowercase();
        let digest = digest_of(&normalized);

        if let Some(cached) = self.cached(&digest) {
            return ComplexityResult {
                complexity: cached,
                confidence: 0.95,
            };
        }

        let (mut tier, mut confidence) = self.scan_catalog(&normalized);

        let word_count = normalized.split_whitespace().count();
        if word_count < 5 && tier >= QueryComplexity::Moderate {
            tier = tier.decrement();
            confidence *= 0.8;
        } else if word_count > 50 && tier <= QueryComplexity::Moderate {
            tier = tier.increment();
            confidence *= 0.9;
        }

        self.insert(digest, tier);

        ComplexityResult {
            complexity: tier,
            confidence,
        }
    }

    fn scan_catalog(&self, normalized: &str) -> (QueryComplexity, f64) {
        for family in CATALOG.iter() {
            if family.patterns.iter().any(|pattern| pattern.is_match(normalized)) {
                let confidence = if family.tier == QueryComplexity::Moderate {
                    0.7
                } else {
                    0.85
                };
                return (family.tier, confidence);
            }
        }
        (QueryComplexity::Moderate, 0.5)
    }

    fn cached(&self, digest: &str) -> Option<QueryComplexity> {
        let history = self.history.lock().unwrap();
        let entry = history.get(digest)?;
        if Utc::now() - entry.inserted_at < self.history_ttl {
            Some(entry.tier)
        } else {
            None
        }
    }

    fn insert(&self, digest: String, tier: QueryComplexity) {
        let mut history = self.history.lock().unwrap();
        let mut order = self.insertion_order.lock().unwrap();

        if !history.contains_key(&digest) {
            order.push_back(digest.clone());
        }
        history.insert(
            digest,
            HistoryEntry {
                tier,
                inserted_at: Utc::now(),
            },
        );

        if history.len() > MAX_HISTORY {
            for _ in 0..EVICT_ON_OVERFLOW {
                if let Some(oldest) = order.pop_front() {
                    history.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }
}

fn digest_of(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_query_classified_trivial() {
        let analyzer = ComplexityAnalyzer::new(30);
        let result = analyzer.analyze("what is http");
        assert_eq!(result.complexity, QueryComplexity::Trivial);
    }

    #[test]
    fn expert_query_classified_expert() {
        let analyzer = ComplexityAnalyzer::new(30);
        let result = analyzer.analyze(
            "prove that every bounded sequence has a convergent subsequence",
        );
        assert_eq!(result.complexity, QueryComplexity::Expert);
    }

    #[test]
    fn unmatched_query_defaults_to_moderate() {
        let analyzer = ComplexityAnalyzer::new(30);
        let result = analyzer.analyze("banana banana banana");
        assert_eq!(result.complexity, QueryComplexity::Moderate);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn short_query_decrements_tier() {
        let analyzer = ComplexityAnalyzer::new(30);
        // "analyze x" matches Moderate, 2 words < 5 -> decrement to Simple.
        let result = analyzer.analyze("analyze x");
        assert_eq!(result.complexity, QueryComplexity::Simple);
    }

    #[test]
    fn long_query_increments_tier() {
        let analyzer = ComplexityAnalyzer::new(30);
        let long_query = format!("explain {}", "word ".repeat(55));
        let result = analyzer.analyze(&long_query);
        assert_eq!(result.complexity, QueryComplexity::Moderate);
    }

    #[test]
    fn repeated_query_hits_cache() {
        let analyzer = ComplexityAnalyzer::new(30);
        let first = analyzer.analyze("what is http");
        let second = analyzer.analyze("what is http");
        assert_eq!(first.complexity, second.complexity);
        assert_eq!(second.confidence, 0.95);
    }

    #[test]
    fn normalization_is_case_and_whitespace_insensitive() {
        let analyzer = ComplexityAnalyzer::new(30);
        analyzer.analyze("What Is HTTP");
        let cached = analyzer.analyze("  what is http  ");
        assert_eq!(cached.confidence, 0.95);
    }
}
