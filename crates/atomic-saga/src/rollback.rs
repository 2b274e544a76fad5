use serde::Serialize;
use serde_json::Value;

use crate::accumulator::{Fields, merge_into};
use crate::audit::{AuditEvent, AuditLevel, AuditSink};
use crate::remote::{RemoteCall, RemoteInvoker};
use crate::state::ExecutionRecord;
use crate::template::template_url;

/// Outcome of one compensating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackEntry {
    pub key: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RollbackEntry {
    #[must_use]
    pub fn succeeded(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ok: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// Variables for a rollback URL.
///
/// The run's chain snapshot is the base; the step's own transform output and
/// then its own execute result are laid over it, so a step's identifiers win
/// over same-named fields produced later in the run.
#[must_use]
pub fn rollback_vars(record: &ExecutionRecord, chain: &Fields) -> Fields {
    let mut vars = chain.clone();
    for own in [record.vars(), record.result()] {
        if let Value::Object(fields) = own {
            merge_into(&mut vars, fields);
        }
    }
    vars
}

/// Compensates completed steps, newest first, without stopping on failure.
pub struct RollbackCoordinator<'a> {
    transaction: &'a str,
    invoker: &'a dyn RemoteInvoker,
    audit: &'a dyn AuditSink,
}

impl<'a> RollbackCoordinator<'a> {
    #[must_use]
    pub fn new(
        transaction: &'a str,
        invoker: &'a dyn RemoteInvoker,
        audit: &'a dyn AuditSink,
    ) -> Self {
        Self {
            transaction,
            invoker,
            audit,
        }
    }

    /// Attempts every record's rollback call exactly once, in strict reverse
    /// of completion order. `chain` is the accumulator snapshot taken when
    /// the run failed and is shared by every call of the sweep.
    #[must_use]
    pub fn rollback(&self, records: &[ExecutionRecord], chain: &Fields) -> Vec<RollbackEntry> {
        records
            .iter()
            .rev()
            .map(|record| self.compensate(record, chain))
            .collect()
    }

    fn compensate(&self, record: &ExecutionRecord, chain: &Fields) -> RollbackEntry {
        let key = record.step().key();
        let rollback = record.step().rollback();
        let url = template_url(rollback.url(), &rollback_vars(record, chain));
        self.audit.emit(
            AuditLevel::Warn,
            &AuditEvent::new("Rollback execute", self.transaction)
                .step(key)
                .field("url", url.as_str())
                .field("method", rollback.method().as_str()),
        );

        let call = RemoteCall::new(rollback, url, record.vars());
        match self.invoker.invoke(&call) {
            Ok(_) => {
                self.audit.emit(
                    AuditLevel::Info,
                    &AuditEvent::new("Rollback succeeded", self.transaction).step(key),
                );
                RollbackEntry::succeeded(key)
            }
            Err(error) => {
                let message = error.to_string();
                self.audit.emit(
                    AuditLevel::Error,
                    &AuditEvent::new("Rollback failed", self.transaction)
                        .step(key)
                        .field("error", message.as_str()),
                );
                RollbackEntry::failed(key, message)
            }
        }
    }
}
