use std::borrow::Cow;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::StepError;
use crate::rollback::RollbackEntry;
use crate::state::ExecutionRecord;

/// Result of one completed step, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step: String,
    pub result: Value,
}

impl From<&ExecutionRecord> for StepResult {
    fn from(record: &ExecutionRecord) -> Self {
        Self {
            step: record.step().key().to_string(),
            result: record.result().clone(),
        }
    }
}

/// Terminal value of one invocation.
///
/// Serializes to the JSON envelope callers receive: `ok`, `transaction`,
/// then `results` on success or `failedStep`, `error` and `rollback` on
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every step succeeded; results follow declared step order.
    Completed {
        transaction: String,
        results: Vec<StepResult>,
    },
    /// A step failed and the completed steps were compensated.
    Aborted {
        transaction: String,
        failed_step: String,
        error: StepError,
        rollback: Vec<RollbackEntry>,
    },
    /// No transaction is registered under the name; nothing ran.
    UnknownTransaction { name: String },
}

impl RunOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The transaction name, absent when it was unknown.
    #[must_use]
    pub fn transaction(&self) -> Option<&str> {
        match self {
            Self::Completed { transaction, .. } | Self::Aborted { transaction, .. } => {
                Some(transaction)
            }
            Self::UnknownTransaction { .. } => None,
        }
    }

    #[must_use]
    pub fn results(&self) -> &[StepResult] {
        match self {
            Self::Completed { results, .. } => results,
            Self::Aborted { .. } | Self::UnknownTransaction { .. } => &[],
        }
    }

    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::Aborted { failed_step, .. } => Some(failed_step),
            Self::Completed { .. } | Self::UnknownTransaction { .. } => None,
        }
    }

    #[must_use]
    pub fn rollback(&self) -> &[RollbackEntry] {
        match self {
            Self::Aborted { rollback, .. } => rollback,
            Self::Completed { .. } | Self::UnknownTransaction { .. } => &[],
        }
    }

    /// Error message of a failed outcome.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Completed { .. } => None,
            Self::Aborted { error, .. } => Some(error.to_string()),
            Self::UnknownTransaction { name } => Some(format!("Unknown transaction: {name}")),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [StepResult]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_step: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Cow<'a, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rollback: Option<&'a [RollbackEntry]>,
}

impl Serialize for RunOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            Self::Completed {
                transaction,
                results,
            } => Envelope {
                ok: true,
                transaction: Some(transaction),
                results: Some(results),
                failed_step: None,
                error: None,
                rollback: None,
            },
            Self::Aborted {
                transaction,
                failed_step,
                error,
                rollback,
            } => Envelope {
                ok: false,
                transaction: Some(transaction),
                results: None,
                failed_step: Some(failed_step),
                error: Some(Cow::Owned(error.to_string())),
                rollback: Some(rollback),
            },
            Self::UnknownTransaction { name } => Envelope {
                ok: false,
                transaction: None,
                results: None,
                failed_step: None,
                error: Some(Cow::Owned(format!("Unknown transaction: {name}"))),
                rollback: None,
            },
        };
        envelope.serialize(serializer)
    }
}
