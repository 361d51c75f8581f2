//! The governed decision path.

use charter::policy::{PolicyError, PolicyStore};
use chrono::Utc;
use classifier::{Classifier, ClassifierError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::{AuditError, AuditRecord, AuditSink};

/// Outcome of a governed inference request, embedded verbatim in the audit
/// record for that request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub predicted_label: String,
    pub confidence: f64,
    pub human_review_required: bool,
}

#[derive(Error, Debug)]
pub enum DecideError {
    /// Request blocked by the governance charter. User-visible, not
    /// retryable, and not an audit event.
    #[error("Request blocked by governance: {0}")]
    Policy(#[from] PolicyError),

    #[error("Model unavailable: {0}")]
    Model(#[from] ClassifierError),

    /// The decision was computed but its record could not be written. The
    /// decision is withheld: decide-and-log is atomic.
    #[error("Audit write failed: {0}")]
    Audit(#[from] AuditError),
}

/// Orchestrates policy check, classification, risk decision, and audit
/// write for each request.
///
/// Collaborators are injected at construction; the service holds no global
/// state and is immutable apart from the audit sink.
pub struct GovernedInferenceService<C, A> {
    policy: PolicyStore,
    classifier: C,
    audit: A,
}

impl<C: Classifier, A: AuditSink> GovernedInferenceService<C, A> {
    pub fn new(policy: PolicyStore, classifier: C, audit: A) -> Self {
        Self {
            policy,
            classifier,
            audit,
        }
    }

    /// Read access to the injected audit sink.
    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Serve one governed inference request.
    ///
    /// Exactly one audit record is appended on success; none on rejection.
    pub fn decide(
        &mut self,
        text: &str,
        use_case: &str,
        requester: &str,
    ) -> Result<Decision, DecideError> {
        let decision_id = Uuid::new_v4();

        if let Err(e) = self.policy.validate_use_case(use_case) {
            warn!(
                %decision_id,
                use_case = %use_case,
                requester = %requester,
                reason = %e,
                "use case blocked by governance"
            );
            return Err(e.into());
        }

        let probabilities = self.classifier.predict_proba(text)?;
        let labels = self.classifier.labels();
        if probabilities.is_empty() || probabilities.len() != labels.len() {
            return Err(ClassifierError::Prediction {
                message: format!(
                    "classifier returned {} probabilities for {} labels",
                    probabilities.len(),
                    labels.len()
                ),
            }
            .into());
        }

        // strict > keeps the earliest maximum: ties resolve to the first
        // label in classifier order
        let mut index = 0;
        let mut confidence = f64::NEG_INFINITY;
        for (i, p) in probabilities.iter().enumerate() {
            if *p > confidence {
                index = i;
                confidence = *p;
            }
        }

        // strict <: confidence exactly at the threshold does not need review
        let human_review_required = confidence < self.policy.confidence_threshold();

        let decision = Decision {
            predicted_label: labels[index].clone(),
            confidence,
            human_review_required,
        };

        let record = AuditRecord {
            timestamp: Utc::now(),
            requester: requester.to_string(),
            use_case: use_case.to_string(),
            model_version: self.classifier.version().to_string(),
            decision: decision.clone(),
        };
        self.audit.append(&record)?;

        debug!(
            %decision_id,
            use_case = %use_case,
            requester = %requester,
            predicted_label = %decision.predicted_label,
            confidence = decision.confidence,
            human_review_required = decision.human_review_required,
            "decision served"
        );

        Ok(decision)
    }
}
