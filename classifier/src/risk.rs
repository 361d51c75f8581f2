//! Stress-set risk analysis.
//!
//! Probes a classifier with ambiguous documents and reports where it is
//! weakest: predictions whose top probability falls below a confidence
//! threshold, and label pairs the model cannot cleanly separate.

use serde::{Deserialize, Serialize};

use crate::{Classifier, ClassifierError};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.65;
pub const DEFAULT_CONFUSION_GAP: f64 = 0.15;

#[derive(Debug, Clone, Deserialize)]
pub struct StressRecord {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LowConfidencePrediction {
    pub id: String,
    pub text: String,
    pub predicted: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfusionPair {
    pub id: String,
    pub top_class: String,
    pub second_class: String,
    pub gap: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RiskReport {
    pub low_confidence: Vec<LowConfidencePrediction>,
    pub confusion_pairs: Vec<ConfusionPair>,
}

#[derive(Debug, Clone, Copy)]
pub struct RiskOptions {
    /// Top probabilities strictly below this are flagged as low confidence.
    pub confidence_threshold: f64,
    /// Top-two gaps strictly below this are flagged as confusion pairs.
    pub confusion_gap: f64,
}

impl Default for RiskOptions {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            confusion_gap: DEFAULT_CONFUSION_GAP,
        }
    }
}

/// Run every stress record through the classifier and collect risk signals.
pub fn analyze<C: Classifier>(
    classifier: &C,
    records: &[StressRecord],
    options: RiskOptions,
) -> Result<RiskReport, ClassifierError> {
    let labels = classifier.labels();
    let mut report = RiskReport::default();

    for record in records {
        let probs = classifier.predict_proba(&record.text)?;

        // rank classes by probability, descending; the sort is stable so
        // equal probabilities keep the classifier's label order
        let mut ranked: Vec<usize> = (0..probs.len()).collect();
        ranked.sort_by(|a, b| {
            probs[*b]
                .partial_cmp(&probs[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let top = ranked[0];
        if probs[top] < options.confidence_threshold {
            report.low_confidence.push(LowConfidencePrediction {
                id: record.id.clone(),
                text: record.text.clone(),
                predicted: labels[top].clone(),
                confidence: probs[top],
            });
        }

        if let Some(&second) = ranked.get(1) {
            let gap = probs[top] - probs[second];
            if gap < options.confusion_gap {
                report.confusion_pairs.push(ConfusionPair {
                    id: record.id.clone(),
                    top_class: labels[top].clone(),
                    second_class: labels[second].clone(),
                    gap,
                });
            }
        }
    }

    Ok(report)
}
