//! TF-IDF + multinomial-logistic model artifact evaluator.
//!
//! The artifact is a JSON export of the trained pipeline: vectorizer
//! vocabulary and IDF weights plus one coefficient row and intercept per
//! class. Feature extraction mirrors the vectorizer settings the pipeline
//! was trained with (lowercase, `\b\w\w+\b` tokens, word n-grams joined by
//! single spaces, L2-normalized TF-IDF), so a loaded artifact scores
//! identically here and in the training environment.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::{Classifier, ClassifierError};

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern must compile"));

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    model_version: String,
    classes: Vec<String>,
    vectorizer: VectorizerArtifact,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

#[derive(Debug)]
pub struct LinearModel {
    model_version: String,
    classes: Vec<String>,
    ngram_range: (usize, usize),
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LinearModel {
    /// Load a model artifact from disk.
    ///
    /// A missing or corrupt artifact is a fatal startup error for the
    /// service.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ClassifierError::ArtifactNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ClassifierError::Io {
            path: path.to_string_lossy().to_string(),
            message: e.to_string(),
        })?;

        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|e| ClassifierError::Malformed {
                message: e.to_string(),
            })?;

        let model = Self::from_artifact(artifact)?;

        debug!(
            model_version = %model.model_version,
            classes = model.classes.len(),
            vocabulary = model.vocabulary.len(),
            "Model artifact loaded"
        );

        Ok(model)
    }

    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        let n_classes = artifact.classes.len();
        let n_terms = artifact.vectorizer.vocabulary.len();

        if n_classes < 2 {
            return Err(inconsistent(format!(
                "expected at least 2 classes, found {}",
                n_classes
            )));
        }
        if artifact.coefficients.len() != n_classes {
            return Err(inconsistent(format!(
                "expected {} coefficient rows, found {}",
                n_classes,
                artifact.coefficients.len()
            )));
        }
        if artifact.intercepts.len() != n_classes {
            return Err(inconsistent(format!(
                "expected {} intercepts, found {}",
                n_classes,
                artifact.intercepts.len()
            )));
        }
        if artifact.vectorizer.idf.len() != n_terms {
            return Err(inconsistent(format!(
                "vocabulary has {} terms but idf has {} weights",
                n_terms,
                artifact.vectorizer.idf.len()
            )));
        }
        for (i, row) in artifact.coefficients.iter().enumerate() {
            if row.len() != n_terms {
                return Err(inconsistent(format!(
                    "coefficient row {} has {} weights, expected {}",
                    i,
                    row.len(),
                    n_terms
                )));
            }
        }
        for (term, index) in &artifact.vectorizer.vocabulary {
            if *index >= n_terms {
                return Err(inconsistent(format!(
                    "term '{}' maps to index {} beyond vocabulary size {}",
                    term, index, n_terms
                )));
            }
        }
        let (lo, hi) = artifact.vectorizer.ngram_range;
        if lo == 0 || lo > hi {
            return Err(inconsistent(format!(
                "invalid ngram range ({}, {})",
                lo, hi
            )));
        }

        Ok(Self {
            model_version: artifact.model_version,
            classes: artifact.classes,
            ngram_range: artifact.vectorizer.ngram_range,
            vocabulary: artifact.vectorizer.vocabulary,
            idf: artifact.vectorizer.idf,
            coefficients: artifact.coefficients,
            intercepts: artifact.intercepts,
        })
    }

    /// Sparse L2-normalized TF-IDF features over the artifact vocabulary.
    fn features(&self, text: &str) -> HashMap<usize, f64> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .collect();

        let (lo, hi) = self.ngram_range;
        let mut weights: HashMap<usize, f64> = HashMap::new();
        for n in lo..=hi {
            if tokens.len() < n {
                break;
            }
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&index) = self.vocabulary.get(term.as_str()) {
                    *weights.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }

        for (index, weight) in weights.iter_mut() {
            *weight *= self.idf[*index];
        }
        let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in weights.values_mut() {
                *weight /= norm;
            }
        }

        weights
    }
}

impl Classifier for LinearModel {
    fn labels(&self) -> &[String] {
        &self.classes
    }

    fn version(&self) -> &str {
        &self.model_version
    }

    fn predict_proba(&self, text: &str) -> Result<Vec<f64>, ClassifierError> {
        let features = self.features(text);

        let mut scores = self.intercepts.clone();
        for (index, weight) in &features {
            for (class, row) in self.coefficients.iter().enumerate() {
                scores[class] += row[*index] * weight;
            }
        }

        Ok(softmax(&scores))
    }
}

fn inconsistent(message: String) -> ClassifierError {
    ClassifierError::Inconsistent { message }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
