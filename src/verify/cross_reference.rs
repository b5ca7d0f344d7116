//! Cross-Reference Validator (spec §4.6 step 5).
//!
//! Consensus across multiple tool outputs: plurality vote for categorical
//! values, mean/std-dev/z-score outlier detection for numeric ones, fused
//! into a single agreement ratio. Ported from the original's
//! `CrossReferenceValidator.validate_consensus`.

use std::collections::HashMap;

const OUTLIER_Z_SCORE: f64 = 2.0;
const CONSENSUS_THRESHOLD: f64 = 0.7;

/// One source's contribution to consensus — either a categorical label or a
/// numeric reading.
#[derive(Debug, Clone)]
pub enum SourceValue {
    Categorical(String),
    Numeric(f64),
}

#[derive(Debug, Clone)]
pub struct ConsensusSource {
    pub tool: String,
    pub value: SourceValue,
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusResult {
    pub consensus_reached: bool,
    pub agreement_ratio: f64,
    pub confidence: f64,
    pub categorical_agreement: Option<f64>,
    pub majority_vote: Option<String>,
    pub numeric_mean: Option<f64>,
    pub numeric_std_dev: Option<f64>,
    pub outliers: Vec<(f64, f64)>,
}

/// Stateless.
#[derive(Default)]
pub struct CrossReferenceValidator;

impl CrossReferenceValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_consensus(&self, sources: &[ConsensusSource]) -> ConsensusResult {
        if sources.len() < 2 {
            return ConsensusResult {
                consensus_reached: true,
                agreement_ratio: 1.0,
                confidence: 0.8,
                ..Default::default()
            };
        }

        let categorical: Vec<&str> = sources
            .iter()
            .filter_map(|s| match &s.value {
                SourceValue::Categorical(v) => Some(v.as_str()),
                SourceValue::Numeric(_) => None,
            })
            .collect();
        let numeric: Vec<f64> = sources
            .iter()
            .filter_map(|s| match &s.value {
                SourceValue::Numeric(v) => Some(*v),
                SourceValue::Categorical(_) => None,
            })
            .collect();

        let (categorical_agreement, majority_vote) = if categorical.is_empty() {
            (None, None)
        } else {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for value in &categorical {
                *counts.entry(value).or_insert(0) += 1;
            }
            let (winner, count) = counts.iter().max_by_key(|(_, count)| **count).unwrap();
            (Some(*count as f64 / categorical.len() as f64), Some(winner.to_string()))
        };

        let (numeric_mean, numeric_std_dev, outliers) = if numeric.is_empty() {
            (None, None, Vec::new())
        } else {
            let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
            let variance = numeric.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / numeric.len() as f64;
            let std_dev = variance.sqrt();
            let outliers: Vec<(f64, f64)> = numeric
                .iter()
                .filter_map(|v| {
                    let z = if std_dev > 0.0 { (v - mean).abs() / std_dev } else { 0.0 };
                    (z > OUTLIER_Z_SCORE).then_some((*v, z))
                })
                .collect();
            (Some(mean), Some(std_dev), outliers)
        };

        let outlier_fraction = if numeric.is_empty() {
            0.0
        } else {
            outliers.len() as f64 / numeric.len() as f64
        };
        let agreement_ratio = (categorical_agreement.unwrap_or(1.0) + (1.0 - outlier_fraction)) / 2.0;
        let consensus_reached = agreement_ratio >= CONSENSUS_THRESHOLD;
        let confidence = (agreement_ratio * 1.2).min(1.0);

        ConsensusResult {
            consensus_reached,
            agreement_ratio,
            confidence,
            categorical_agreement,
            majority_vote,
            numeric_mean,
            numeric_std_dev,
            outliers,
        }
    }
}
