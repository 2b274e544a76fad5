use std::fmt;

use thiserror::Error;

use crate::definition::HttpMethod;

/// Error reported by a transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure of a remote call, for both execute and rollback calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RemoteCallError {
    /// The remote side answered with a non-success status.
    #[error("[{method}] \"{url}\": {status} {body}")]
    Status {
        method: HttpMethod,
        url: String,
        status: u16,
        body: String,
    },

    /// The call never produced a response.
    #[error("[{method}] \"{url}\": {message}")]
    Transport {
        method: HttpMethod,
        url: String,
        message: String,
    },

    /// The response arrived but its body could not be read.
    #[error("[{method}] \"{url}\": unreadable response body: {message}")]
    Body {
        method: HttpMethod,
        url: String,
        message: String,
    },
}

/// Reason a single step failed.
///
/// Every variant aborts the run and triggers the rollback sweep.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StepError {
    #[error("no transform registered for '{reference}'")]
    TransformNotFound { reference: String },

    #[error("transform '{reference}' failed: {error}")]
    Transform {
        reference: String,
        error: TransformError,
    },

    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),
}

/// A malformed transaction definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("transaction has no steps")]
    NoSteps,

    #[error("step at position {index} has an empty key")]
    EmptyKey { index: usize },

    #[error("duplicate step key '{key}'")]
    DuplicateKey { key: String },

    #[error("step '{key}' has an empty {call} url")]
    EmptyUrl { key: String, call: &'static str },

    #[error("unknown HTTP method '{0}'")]
    UnknownMethod(String),

    #[error("unknown step mode '{0}'")]
    UnknownMode(String),
}

/// A step whose transform reference has no registered transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedTransform {
    pub transaction: String,
    pub step: String,
    pub reference: String,
}

impl fmt::Display for UnresolvedTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} references unregistered transform '{}'",
            self.transaction, self.step, self.reference
        )
    }
}

/// Error building an [`Engine`](crate::Engine).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("transaction '{0}' is registered more than once")]
    DuplicateTransaction(String),

    #[error("{} step(s) reference unregistered transforms", .0.len())]
    UnresolvedTransforms(Vec<UnresolvedTransform>),
}
