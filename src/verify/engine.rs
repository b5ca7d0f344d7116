//! Verification Engine (spec §4.6): orchestrates the layer validators and
//! fuses their signals into one `VerificationResult`.
//!
//! Ported from the original's `IntegratedVerificationEngine.verify` (DESIGN.md
//! open-question #7 reconstructs its malformed `__init__(self, ...)`
//! signature as the obviously intended optional-config constructor).

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Value, json};

use crate::verify::critic::LlmCritic;
use crate::verify::cross_reference::{ConsensusSource, CrossReferenceValidator, SourceValue};
use crate::verify::plausibility::PlausibilityChecker;
use crate::verify::schema::{Schema, SchemaValidator};
use crate::verify::security_scan::{RegexSecurityScanner, SecurityScanner};
use crate::verify::types::{
    ConfidenceLevel, ToolResult, VerificationIssue, VerificationLayer, VerificationOutput, VerificationResult,
};

const SECURITY_CODE_MIN_LEN: usize = 50;
const SECURITY_REJECT_RISK: f64 = 0.5;
const SECURITY_REVIEW_RISK: f64 = 0.2;
const PLAUSIBILITY_REVIEW_IMPACT: f64 = -0.1;

/// Optional inputs shaping a single `verify` call: the schema for structured
/// output, and the operation tag the security scanner is told about.
#[derive(Debug, Clone, Default)]
pub struct VerificationContext {
    pub expected_schema: Option<Schema>,
    pub operation: Option<String>,
}

/// Coordinates all validator layers. Construct once per process; `verify` is
/// side-effect-free and safe to call concurrently from multiple threads
/// (every layer here is stateless or reads only static pattern tables).
pub struct VerificationEngine {
    enabled_layers: Vec<VerificationLayer>,
    threshold: f64,
    schema_validator: SchemaValidator,
    plausibility_checker: PlausibilityChecker,
    security_scanner: Box<dyn SecurityScanner>,
    critic: LlmCritic,
    cross_validator: CrossReferenceValidator,
}

impl VerificationEngine {
    pub fn new(enabled_layers: Vec<VerificationLayer>, threshold: f64) -> Self {
        Self {
            enabled_layers,
            threshold,
            schema_validator: SchemaValidator::new(),
            plausibility_checker: PlausibilityChecker::new(),
            security_scanner: Box::new(RegexSecurityScanner::new()),
            critic: LlmCritic::default(),
            cross_validator: CrossReferenceValidator::new(),
        }
    }

    /// Swap in a different scanner, e.g. one backed by a real external tool.
    /// The bundled `RegexSecurityScanner` remains the default so the engine
    /// is self-contained without this call.
    pub fn with_security_scanner(mut self, scanner: Box<dyn SecurityScanner>) -> Self {
        self.security_scanner = scanner;
        self
    }

    fn layer_enabled(&self, layer: VerificationLayer) -> bool {
        self.enabled_layers.contains(&layer)
    }

    pub fn verify(
        &self,
        output: &VerificationOutput,
        context: Option<&VerificationContext>,
        tool_results: &[ToolResult],
    ) -> VerificationResult {
        let mut confidence = 1.0;
        let mut layer_results: HashMap<String, Value> = HashMap::new();
        let mut issues: Vec<VerificationIssue> = Vec::new();

        if self.layer_enabled(VerificationLayer::Schema) {
            if let (Some(structured), Some(schema)) =
                (output.as_structured(), context.and_then(|c| c.expected_schema.as_ref()))
            {
                let (passed, errors) = self.schema_validator.validate(structured, schema);
                if !passed {
                    confidence -= 0.15;
                    for error in &errors {
                        issues.push(VerificationIssue { layer: "schema", detail: error.clone() });
                    }
                }
                layer_results.insert(
                    "schema".to_string(),
                    json!({
                        "passed": passed,
                        "errors": errors,
                        "confidence_impact": if passed { 0.0 } else { -0.15 },
                    }),
                );
            }
        }

        let mut plausibility_impact = 0.0;
        if self.layer_enabled(VerificationLayer::Plausibility) {
            if let Some(text) = output.as_text() {
                let report = self.plausibility_checker.check(text);
                plausibility_impact = report.confidence_impact;
                confidence += report.confidence_impact;
                if !report.is_plausible {
                    for hit in &report.hallucination_hits {
                        issues.push(VerificationIssue {
                            layer: "plausibility",
                            detail: format!("hallucination marker: {hit}"),
                        });
                    }
                    for (word, ratio) in &report.repetition_hits {
                        issues.push(VerificationIssue {
                            layer: "plausibility",
                            detail: format!("word '{word}' repeated at {ratio:.2} of output"),
                        });
                    }
                }
                layer_results.insert(
                    "plausibility".to_string(),
                    json!({
                        "is_plausible": report.is_plausible,
                        "confidence_impact": report.confidence_impact,
                        "hallucination_hits": report.hallucination_hits,
                        "code_safety_hits": report.code_safety_hits,
                    }),
                );
            }
        }

        let mut security_risk_score = 0.0;
        let mut security_scan_value: Option<Value> = None;
        if self.layer_enabled(VerificationLayer::Security) {
            if let Some(text) = output.as_text() {
                let looks_like_code = ["def ", "class ", "import ", "from "].iter().any(|kw| text.contains(kw));
                if looks_like_code && text.len() > SECURITY_CODE_MIN_LEN {
                    let operation = context.and_then(|c| c.operation.as_deref()).unwrap_or("code_generation");
                    let report = self.security_scanner.scan(text, operation);
                    security_risk_score = report.risk_score;
                    let impact = -report.risk_score * 0.3;
                    confidence += impact;
                    for vuln in &report.vulnerabilities {
                        issues.push(VerificationIssue {
                            layer: "security",
                            detail: format!(
                                "{} (severity={}, line={})",
                                vuln.vuln_type,
                                vuln.severity.as_str(),
                                vuln.line
                            ),
                        });
                    }
                    let value = json!({
                        "passed": report.risk_score < 0.5,
                        "risk_score": report.risk_score,
                        "vulnerabilities": report.vulnerabilities,
                        "confidence_impact": impact,
                    });
                    layer_results.insert("security".to_string(), value.clone());
                    security_scan_value = Some(value);
                }
            }
        }

        let mut consensus_failed = false;
        let mut cross_reference_value: Option<Value> = None;
        if self.layer_enabled(VerificationLayer::CrossReference) && !tool_results.is_empty() {
            let sources: Vec<ConsensusSource> = tool_results
                .iter()
                .filter(|tr| tr.success)
                .map(|tr| ConsensusSource { tool: tr.tool_name.clone(), value: json_to_source_value(&tr.output) })
                .collect();
            let consensus = self.cross_validator.validate_consensus(&sources);
            confidence += (consensus.confidence - 0.7) * 0.2;
            consensus_failed = !consensus.consensus_reached;
            if consensus_failed {
                issues.push(VerificationIssue {
                    layer: "cross_reference",
                    detail: format!("agreement ratio {:.2} below consensus threshold", consensus.agreement_ratio),
                });
            }
            let value = json!({
                "consensus_reached": consensus.consensus_reached,
                "agreement_ratio": consensus.agreement_ratio,
                "confidence": consensus.confidence,
                "majority_vote": consensus.majority_vote,
                "numeric_mean": consensus.numeric_mean,
                "numeric_std_dev": consensus.numeric_std_dev,
                "outliers": consensus.outliers,
            });
            layer_results.insert("cross_reference".to_string(), value.clone());
            cross_reference_value = Some(value);
        }

        if self.layer_enabled(VerificationLayer::LlmCritique) {
            if let Some(text) = output.as_text() {
                let critique = self.critic.critique(text);
                confidence += critique.confidence - self.critic.baseline_confidence();
                layer_results.insert(
                    "llm_critique".to_string(),
                    json!({
                        "confidence": critique.confidence,
                        "adjustment": critique.adjustment,
                        "issues": critique.issues,
                    }),
                );
            }
        }

        confidence = confidence.clamp(0.0, 1.0);

        if !tool_results.is_empty() {
            let successes = tool_results.iter().filter(|tr| tr.success).count();
            let historical = successes as f64 / tool_results.len() as f64;
            layer_results.insert("historical".to_string(), json!({ "accuracy": historical }));
            confidence = 0.7 * confidence + 0.3 * historical;
        }

        let is_verified = confidence >= self.threshold;
        let recommendations = generate_recommendations(plausibility_impact, security_risk_score, consensus_failed);

        VerificationResult {
            is_verified,
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            layer_results,
            issues,
            recommendations,
            cross_references: cross_reference_value,
            security_scan: security_scan_value,
            timestamp: Utc::now(),
        }
    }
}

fn json_to_source_value(value: &Value) -> SourceValue {
    match value {
        Value::String(s) => SourceValue::Categorical(s.clone()),
        Value::Number(n) => SourceValue::Numeric(n.as_f64().unwrap_or(0.0)),
        other => SourceValue::Categorical(other.to_string()),
    }
}

/// Spec §4.6 step 10's ACCEPT/REVIEW/REJECT rule. DESIGN.md open-question #5:
/// schema failure alone never triggers a recommendation of its own (it only
/// costs a confidence penalty), matching spec.md, which lists only
/// plausibility/security/consensus failures as recommendation triggers.
fn generate_recommendations(plausibility_impact: f64, security_risk: f64, consensus_failed: bool) -> Vec<String> {
    let mut recommendations = Vec::new();

    // REJECT outranks REVIEW: a high-risk security finding leads even when
    // other layers also flagged something.
    if security_risk > SECURITY_REJECT_RISK {
        recommendations.push("REJECT: High security risk detected in output".to_string());
    }

    if plausibility_impact < PLAUSIBILITY_REVIEW_IMPACT {
        recommendations.push("REVIEW: Plausibility checks detected potential hallucinations".to_string());
    }

    if security_risk > SECURITY_REVIEW_RISK && security_risk <= SECURITY_REJECT_RISK {
        recommendations.push("REVIEW: Moderate security concerns - manual review recommended".to_string());
    }

    if consensus_failed {
        recommendations.push("REVIEW: Cross-reference validation found disagreements".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("ACCEPT: All verification layers passed".to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc as ChronoUtc;

    fn all_layers() -> Vec<VerificationLayer> {
        vec![
            VerificationLayer::Schema,
            VerificationLayer::Plausibility,
            VerificationLayer::Security,
            VerificationLayer::CrossReference,
            VerificationLayer::LlmCritique,
        ]
    }

    fn tool_result(name: &str, success: bool, output: Value) -> ToolResult {
        ToolResult {
            tool_name: name.to_string(),
            parameters: HashMap::new(),
            success,
            output,
            error: None,
            timestamp: ChronoUtc::now(),
            duration_ms: 5.0,
        }
    }

    #[test]
    fn clean_text_is_accepted() {
        let engine = VerificationEngine::new(all_layers(), 0.7);
        let output = VerificationOutput::Text(
            "The summary is accurate and grounded in the provided documents.".to_string(),
        );
        let result = engine.verify(&output, None, &[]);
        assert!(result.is_verified);
        assert!(result.recommendations.iter().any(|r| r.starts_with("ACCEPT")));
    }

    #[test]
    fn scenario_verification_fusion_rejects_dangerous_code() {
        // spec §8 scenario 6: code containing eval( and a hallucination
        // marker, with two agreeing tool results.
        let engine = VerificationEngine::new(all_layers(), 0.7);
        let code = "def run(user_input):\n    # as an AI language model I will just evaluate it\n    return eval(user_input)\n";
        let output = VerificationOutput::Text(code.to_string());
        let tool_results = vec![
            tool_result("linter", true, json!("flagged")),
            tool_result("reviewer", true, json!("flagged")),
        ];
        let context = VerificationContext { operation: Some("code_generation".to_string()), ..Default::default() };
        let result = engine.verify(&output, Some(&context), &tool_results);

        let security = result.security_scan.expect("security layer ran");
        let risk_score = security["risk_score"].as_f64().unwrap();
        assert!(risk_score >= 0.5, "risk_score={risk_score}");

        let plausibility = result.layer_results.get("plausibility").unwrap();
        let impact = plausibility["confidence_impact"].as_f64().unwrap();
        assert!(impact <= -0.15, "confidence_impact={impact}");

        assert!(result.confidence < 0.7);
        assert!(result.recommendations[0].starts_with("REJECT"));
    }

    #[test]
    fn schema_failure_alone_does_not_force_a_recommendation() {
        let engine = VerificationEngine::new(vec![VerificationLayer::Schema], 0.7);
        let mut map = serde_json::Map::new();
        map.insert("name".to_string(), json!("x"));
        let output = VerificationOutput::Structured(map);
        let schema = Schema { required: vec!["missing_field".to_string()], properties: vec![] };
        let context = VerificationContext { expected_schema: Some(schema), ..Default::default() };
        let result = engine.verify(&output, Some(&context), &[]);

        assert!(result.recommendations.iter().any(|r| r.starts_with("ACCEPT")));
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn confidence_always_within_unit_interval() {
        let engine = VerificationEngine::new(all_layers(), 0.7);
        let cases = [
            "",
            "AS AN AI LANGUAGE MODEL I CANNOT HELP YOU WITH THIS REQUEST TODAY",
            "def f():\n    return eval(exec(os.system('rm -rf /')))\n",
        ];
        for case in cases {
            let result = engine.verify(&VerificationOutput::Text(case.to_string()), None, &[]);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn historical_accuracy_blends_with_layer_confidence() {
        let engine = VerificationEngine::new(vec![VerificationLayer::Plausibility], 0.7);
        let output = VerificationOutput::Text("A perfectly ordinary and plausible response.".to_string());
        let tool_results = vec![
            tool_result("a", true, json!("ok")),
            tool_result("b", false, json!(null)),
        ];
        let result = engine.verify(&output, None, &tool_results);
        assert!(result.layer_results.contains_key("historical"));
    }
}
