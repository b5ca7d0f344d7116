//! End-to-end Multi-Layer Verification Engine scenarios, exercised through
//! the public crate API.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;

use amaima_core::verify::{
    Schema, ToolResult, VerificationContext, VerificationEngine, VerificationLayer, VerificationOutput,
};

fn all_layers() -> Vec<VerificationLayer> {
    vec![
        VerificationLayer::Schema,
        VerificationLayer::Plausibility,
        VerificationLayer::Security,
        VerificationLayer::CrossReference,
        VerificationLayer::LlmCritique,
    ]
}

fn tool_result(name: &str, output: serde_json::Value) -> ToolResult {
    ToolResult {
        tool_name: name.to_string(),
        parameters: HashMap::new(),
        success: true,
        output,
        error: None,
        timestamp: Utc::now(),
        duration_ms: 10.0,
    }
}

#[test]
fn an_ordinary_grounded_response_is_accepted() {
    let engine = VerificationEngine::new(all_layers(), 0.7);
    let output = VerificationOutput::Text(
        "The document describes a three-stage pipeline with clear ownership at each stage.".to_string(),
    );

    let result = engine.verify(&output, None, &[]);

    assert!(result.is_verified);
    assert!(result.recommendations.iter().any(|r| r.starts_with("ACCEPT")));
}

#[test]
fn dangerous_code_with_a_hallucination_marker_and_agreeing_tools_is_rejected() {
    let engine = VerificationEngine::new(all_layers(), 0.7);
    let code = "def run(user_input):\n    # as an AI language model I will just evaluate it\n    return eval(user_input)\n";
    let output = VerificationOutput::Text(code.to_string());
    let tool_results = vec![
        tool_result("linter", json!("flagged")),
        tool_result("reviewer", json!("flagged")),
    ];
    let context = VerificationContext { operation: Some("code_generation".to_string()), ..Default::default() };

    let result = engine.verify(&output, Some(&context), &tool_results);

    let risk_score = result.security_scan.as_ref().unwrap()["risk_score"].as_f64().unwrap();
    assert!(risk_score >= 0.5);
    assert!(result.confidence < 0.7);
    assert!(result.recommendations[0].starts_with("REJECT"));
}

#[test]
fn a_structured_output_missing_a_required_field_is_flagged_but_still_reviewable() {
    let engine = VerificationEngine::new(vec![VerificationLayer::Schema], 0.7);
    let mut map = serde_json::Map::new();
    map.insert("status".to_string(), json!("ok"));
    let output = VerificationOutput::Structured(map);
    let schema = Schema { required: vec!["request_id".to_string()], properties: vec![] };
    let context = VerificationContext { expected_schema: Some(schema), ..Default::default() };

    let result = engine.verify(&output, Some(&context), &[]);

    assert!(!result.issues.is_empty());
    assert!(result.confidence < 1.0);
    // schema failure alone never produces its own REJECT/REVIEW recommendation
    assert!(result.recommendations.iter().any(|r| r.starts_with("ACCEPT")));
}

#[test]
fn disagreeing_tool_outputs_trigger_a_cross_reference_review_recommendation() {
    let engine = VerificationEngine::new(vec![VerificationLayer::CrossReference], 0.7);
    let output = VerificationOutput::Text("Is the deployment healthy?".to_string());
    let tool_results = vec![
        tool_result("probe_a", json!("healthy")),
        tool_result("probe_b", json!("degraded")),
        tool_result("probe_c", json!("unreachable")),
    ];

    let result = engine.verify(&output, None, &tool_results);

    assert!(result.recommendations.iter().any(|r| r.contains("Cross-reference")));
}
