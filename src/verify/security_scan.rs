//! Security Scanner interface (spec §4.6 step 4, §6).
//!
//! `SecurityScanner` is the pluggable seam the original wires to DARPA-branded
//! tools (`buttercup`/`sweetbaby`, out of scope per spec.md §1 — specified
//! only via the abstract interface they satisfy). `RegexSecurityScanner` is
//! the mandatory bundled fallback, ported from the original's
//! `_fallback_scan` pattern table (DESIGN.md open-question #6 reconstructs
//! the two corrupted tuple literals in the retrieved source as a SQL
//! injection pattern and a `subprocess(..., shell=True)` pattern).

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn weight(self) -> f64 {
        match self {
            Self::Low => 0.2,
            Self::Medium => 0.5,
            Self::High => 0.8,
            Self::Critical => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Vulnerability {
    pub vuln_type: String,
    pub severity: Severity,
    pub line: usize,
    pub auto_patchable: bool,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecurityScanReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub risk_score: f64,
    pub auto_patches: Vec<String>,
    pub patched_code: Option<String>,
}

/// `scan(code, operation) -> {vulnerabilities, risk_score, auto_patches,
/// patched_code?}` (spec §6). A pure-regex fallback must always be bundled so
/// the core is self-contained (spec §9).
pub trait SecurityScanner: Send + Sync {
    fn scan(&self, code: &str, operation: &str) -> SecurityScanReport;
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("security scan pattern is valid regex")
}

struct DangerousPattern {
    regex: Regex,
    description: &'static str,
    severity: Severity,
}

static DANGEROUS_PATTERNS: LazyLock<Vec<DangerousPattern>> = LazyLock::new(|| {
    vec![
        DangerousPattern {
            regex: re(r"(?i)os\.system\s*\("),
            description: "Command injection via os.system",
            severity: Severity::High,
        },
        DangerousPattern {
            regex: re(r"(?i)subprocess\."),
            description: "Command injection via subprocess",
            severity: Severity::High,
        },
        DangerousPattern {
            regex: re(r"(?i)eval\s*\("),
            description: "Code injection via eval",
            severity: Severity::Critical,
        },
        DangerousPattern {
            regex: re(r"(?i)exec\s*\("),
            description: "Code injection via exec",
            severity: Severity::Critical,
        },
        DangerousPattern {
            regex: re(r"(?i)pickle\.loads?"),
            description: "Insecure deserialization",
            severity: Severity::High,
        },
        DangerousPattern {
            regex: re(r"(?i)yaml\.load\s*\("),
            description: "YAML deserialization vulnerability",
            severity: Severity::Medium,
        },
        DangerousPattern {
            regex: re(r"(?i)(\bor\s+1\s*=\s*1\b|;\s*drop\s+table\b|union\s+select\b)"),
            description: "SQL injection vulnerability",
            severity: Severity::Critical,
        },
        DangerousPattern {
            regex: re(r"(?i)subprocess\.\w+\([^)]*shell\s*=\s*True"),
            description: "Shell injection vulnerability",
            severity: Severity::High,
        },
        DangerousPattern {
            regex: re(r#"(?i)password\s*=\s*["'][^"']+["']"#),
            description: "Hardcoded password",
            severity: Severity::Medium,
        },
        DangerousPattern {
            regex: re(r#"(?i)api[_-]?key\s*=\s*["'][^"']+["']"#),
            description: "Hardcoded API key",
            severity: Severity::High,
        },
    ]
});

/// Bundled mandatory fallback: always available, no external tool required.
#[derive(Default)]
pub struct RegexSecurityScanner;

impl RegexSecurityScanner {
    pub fn new() -> Self {
        Self
    }
}

impl SecurityScanner for RegexSecurityScanner {
    fn scan(&self, code: &str, _operation: &str) -> SecurityScanReport {
        let mut vulnerabilities = Vec::new();

        for pattern in DANGEROUS_PATTERNS.iter() {
            for m in pattern.regex.find_iter(code) {
                let line = code[..m.start()].matches('\n').count() + 1;
                vulnerabilities.push(Vulnerability {
                    vuln_type: pattern.description.to_string(),
                    severity: pattern.severity,
                    line,
                    auto_patchable: true,
                });
            }
        }

        let risk_score = vulnerabilities
            .iter()
            .map(|v| v.severity.weight())
            .sum::<f64>()
            .min(1.0);

        SecurityScanReport {
            vulnerabilities,
            risk_score,
            auto_patches: Vec::new(),
            patched_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_is_critical() {
        let scanner = RegexSecurityScanner::new();
        let report = scanner.scan("result = eval(user_input)", "code_generation");
        assert!(report.vulnerabilities.iter().any(|v| v.severity == Severity::Critical));
    }

    #[test]
    fn clean_code_has_zero_risk() {
        let scanner = RegexSecurityScanner::new();
        let report = scanner.scan("def add(a, b):\n    return a + b\n", "code_generation");
        assert!(report.vulnerabilities.is_empty());
        assert_eq!(report.risk_score, 0.0);
    }

    #[test]
    fn risk_score_clamped_to_one() {
        let scanner = RegexSecurityScanner::new();
        let code = "eval(a)\nexec(b)\nos.system(c)\nsubprocess.run(d)\npickle.loads(e)\n";
        let report = scanner.scan(code, "code_generation");
        assert!(report.risk_score <= 1.0);
    }

    #[test]
    fn hardcoded_password_detected() {
        let scanner = RegexSecurityScanner::new();
        let report = scanner.scan("password = \"hunter2\"", "code_generation");
        assert!(report.vulnerabilities.iter().any(|v| v.vuln_type == "Hardcoded password"));
    }

    #[test]
    fn line_number_tracks_occurrence() {
        let scanner = RegexSecurityScanner::new();
        let code = "x = 1\ny = 2\neval(z)\n";
        let report = scanner.scan(code, "code_generation");
        let hit = report.vulnerabilities.iter().find(|v| v.vuln_type.contains("eval")).unwrap();
        assert_eq!(hit.line, 3);
    }
}
