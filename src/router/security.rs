//! Security Classifier (spec §4.3).
//!
//! Two ordered pattern lists, first-hit-wins: critical beats elevated beats
//! standard. Every non-Standard hit is logged via the shared
//! [`crate::observability::SecurityEventLog`].

use std::sync::LazyLock;

use regex::Regex;

use crate::observability::SecurityEventLog;
use crate::router::types::SecurityLevel;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("security pattern is valid regex")
}

static CRITICAL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("sudo", re(r"\bsudo\b")),
        ("rm -rf", re(r"rm\s+-rf\b")),
        ("chmod 777", re(r"chmod\s+777\b")),
        ("drop database", re(r"drop\s+database\b")),
        ("delete from", re(r"delete\s+from\b")),
        ("eval(", re(r"eval\s*\(")),
        ("exec(", re(r"exec\s*\(")),
        ("subprocess", re(r"\bsubprocess\b")),
    ]
});

static ELEVATED_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("import os/sys", re(r"\bimport\s+(os|sys)\b")),
        ("file read/write/create", re(r"\b(read|write|create)\s+(a\s+)?file\b")),
        ("connect to db/server/api", re(r"connect\s+to\s+(db|database|server|api)\b")),
        ("http request", re(r"http\s+(request|get|post)\b")),
    ]
});

/// Stateless classifier; the event log is threaded in by the caller so it
/// can be shared across classifications.
pub struct SecurityClassifier;

impl SecurityClassifier {
    pub fn new() -> Self {
        Self
    }

    /// `operation` is accepted for interface parity with the original
    /// `(operation_tag, query)` signature; the pattern scan itself only
    /// inspects `query` text (the original likewise never branches on the
    /// operation tag inside `assess_security_level`).
    pub fn classify(&self, _operation: &str, query: &str, events: &SecurityEventLog) -> SecurityLevel {
        let lower = query.to_lowercase();

        for (name, pattern) in CRITICAL_PATTERNS.iter() {
            if pattern.is_match(&lower) {
                events.record(SecurityLevel::Critical, *name, query);
                return SecurityLevel::Critical;
            }
        }

        for (name, pattern) in ELEVATED_PATTERNS.iter() {
            if pattern.is_match(&lower) {
                events.record(SecurityLevel::Elevated, *name, query);
                return SecurityLevel::Elevated;
            }
        }

        SecurityLevel::Standard
    }
}

impl Default for SecurityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_pattern_wins_over_elevated() {
        let classifier = SecurityClassifier::new();
        let events = SecurityEventLog::new();
        let level = classifier.classify("code_generation", "import os and then rm -rf /", &events);
        assert_eq!(level, SecurityLevel::Critical);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn elevated_pattern_detected() {
        let classifier = SecurityClassifier::new();
        let events = SecurityEventLog::new();
        let level = classifier.classify("general", "please import sys for me", &events);
        assert_eq!(level, SecurityLevel::Elevated);
    }

    #[test]
    fn standard_when_no_pattern_matches() {
        let classifier = SecurityClassifier::new();
        let events = SecurityEventLog::new();
        let level = classifier.classify("general", "what's the weather today", &events);
        assert_eq!(level, SecurityLevel::Standard);
        assert!(events.is_empty());
    }
}
