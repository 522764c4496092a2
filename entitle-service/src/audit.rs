//! Audit records for privileged operations.
//!
//! Every add/remove call produces exactly one [`AuditRecord`]. The record is
//! created with a `Fail` outcome and flipped to `Success` only on the happy
//! path. [`AuditGuard`] emits it on drop, so early returns and `?` exits are
//! recorded the same way as successful ones.

use crate::actor::Actor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Metadata key holding the failure annotation.
pub const META_FAILURE: &str = "failure";
/// Metadata key holding the uploaded attachment's filename.
pub const META_FILENAME: &str = "filename";

/// Final outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Fail,
    Success,
}

/// One audited operation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub operation: String,
    pub actor: String,
    pub outcome: AuditOutcome,
    /// Ordered key/value annotations.
    pub meta: Vec<(String, String)>,
    pub started_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Creates a record defaulted to failure.
    pub fn new(operation: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            operation: operation.into(),
            actor: actor.into(),
            outcome: AuditOutcome::Fail,
            meta: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Adds or overwrites an annotation.
    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.meta.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.meta.push((key, value)),
        }
    }

    pub fn mark_success(&mut self) {
        self.outcome = AuditOutcome::Success;
    }

    /// Returns the value of an annotation.
    #[must_use]
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sink for audit records.
///
/// `emit` is infallible to callers: an implementation that cannot persist a
/// record reports that itself and must never mask the operation's own error.
pub trait AuditRecorder: Send + Sync {
    /// Opens a record for `operation` performed by `actor`.
    fn begin(&self, operation: &str, actor: &Actor) -> AuditRecord {
        AuditRecord::new(operation, actor.audit_id())
    }

    /// Persists a finished record. Called exactly once per record.
    fn emit(&self, record: AuditRecord);
}

/// Writes audit records as structured events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditRecorder;

impl AuditRecorder for TracingAuditRecorder {
    fn emit(&self, record: AuditRecord) {
        let meta = serde_json::to_string(&record.meta).unwrap_or_default();
        info!(
            target: "audit",
            id = %record.id,
            operation = %record.operation,
            actor = %record.actor,
            outcome = ?record.outcome,
            meta = %meta,
            "audit record"
        );
    }
}

/// Keeps audit records in memory. Useful for tests and admin inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditRecorder {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every emitted record, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditRecorder for MemoryAuditRecorder {
    fn emit(&self, record: AuditRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// Owns an in-flight [`AuditRecord`] and emits it exactly once on drop.
pub struct AuditGuard {
    recorder: Arc<dyn AuditRecorder>,
    record: Option<AuditRecord>,
}

impl AuditGuard {
    /// Opens a record through `recorder` and logs the attempt.
    pub fn begin(recorder: Arc<dyn AuditRecorder>, operation: &str, actor: &Actor) -> Self {
        let record = recorder.begin(operation, actor);
        info!(target: "audit", operation, actor = actor.audit_id(), "attempt");
        Self {
            recorder,
            record: Some(record),
        }
    }

    pub fn annotate(&mut self, key: &str, value: impl Into<String>) {
        if let Some(record) = self.record.as_mut() {
            record.annotate(key, value);
        }
    }

    /// Annotates the record with a failure reason and logs it.
    pub fn fail(&mut self, reason: &str) {
        if let Some(record) = self.record.as_mut() {
            warn!(target: "audit", operation = %record.operation, "failed - {reason}");
            record.annotate(META_FAILURE, reason);
        }
    }

    /// Marks the record successful and logs it.
    pub fn succeed(&mut self) {
        if let Some(record) = self.record.as_mut() {
            record.mark_success();
            info!(target: "audit", operation = %record.operation, "success");
        }
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.recorder.emit(record);
        }
    }
}
