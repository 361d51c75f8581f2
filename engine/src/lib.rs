//! Governed inference engine: policy check, classification, risk decision,
//! and audit logging as one atomic decision path.

pub mod audit;
pub mod service;

pub use audit::{AuditError, AuditRecord, AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use service::{DecideError, Decision, GovernedInferenceService};
