//! Append-only audit sink.
//!
//! Every served decision is recorded as one JSON object per line. The sink
//! never fails silently: an unlogged governed decision is a compliance
//! violation, so write failures propagate to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::service::Decision;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to open audit log {path}: {message}")]
    Open { path: String, message: String },

    #[error("Failed to serialize audit record: {message}")]
    Serialize { message: String },

    #[error("Failed to append audit record: {message}")]
    Write { message: String },
}

/// One served decision: who asked for what, what was decided, and when.
///
/// Records are immutable once written and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub requester: String,
    pub use_case: String,
    pub model_version: String,
    pub decision: Decision,
}

pub trait AuditSink {
    /// Append a record. Errors must propagate; a decision whose record was
    /// not written is not a served decision.
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// File-backed JSON Lines audit log.
#[derive(Debug)]
pub struct JsonlAuditLog {
    file: File,
}

impl JsonlAuditLog {
    /// Create parent directories as needed and open the log for appending.
    ///
    /// Storage unavailability surfaces here, at service startup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AuditError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AuditError::Open {
                    path: path.to_string_lossy().to_string(),
                    message: e.to_string(),
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| AuditError::Open {
                path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            })?;

        debug!("Audit log opened at {:?}", path);

        Ok(Self { file })
    }
}

impl AuditSink for JsonlAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record).map_err(|e| AuditError::Serialize {
            message: e.to_string(),
        })?;
        line.push(b'\n');

        // one write call per record: concurrent appenders on an O_APPEND
        // file never interleave bytes of two records
        self.file.write_all(&line).map_err(|e| AuditError::Write {
            message: e.to_string(),
        })?;
        self.file.flush().map_err(|e| AuditError::Write {
            message: e.to_string(),
        })?;

        Ok(())
    }
}

/// In-memory sink for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Vec<AuditRecord>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.push(record.clone());
        Ok(())
    }
}
