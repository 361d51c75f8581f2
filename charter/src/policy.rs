use std::collections::HashSet;

use thiserror::Error;

use crate::config::GovernanceConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("use case '{use_case}' is explicitly prohibited")]
    UseCaseProhibited { use_case: String },

    #[error("use case '{use_case}' is not in the approved use cases")]
    UseCaseNotApproved { use_case: String },
}

/// Immutable view over a loaded governance charter.
///
/// Pure reads only; the store never changes after construction.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    approved: HashSet<String>,
    prohibited: HashSet<String>,
    confidence_threshold: f64,
    human_in_the_loop: bool,
}

impl PolicyStore {
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            approved: config.usage.approved.into_iter().collect(),
            prohibited: config.usage.prohibited.into_iter().collect(),
            confidence_threshold: config.risk_controls.confidence_threshold,
            human_in_the_loop: config.risk_controls.human_in_the_loop,
        }
    }

    /// Check a requested use against the charter.
    ///
    /// Prohibition takes precedence: a use case listed in both sets fails
    /// with `UseCaseProhibited`.
    pub fn validate_use_case(&self, requested_use: &str) -> Result<(), PolicyError> {
        if self.prohibited.contains(requested_use) {
            return Err(PolicyError::UseCaseProhibited {
                use_case: requested_use.to_string(),
            });
        }
        if !self.approved.contains(requested_use) {
            return Err(PolicyError::UseCaseNotApproved {
                use_case: requested_use.to_string(),
            });
        }
        Ok(())
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn human_in_the_loop_required(&self) -> bool {
        self.human_in_the_loop
    }
}
