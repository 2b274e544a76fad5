use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::accumulator::Fields;

/// Severity of an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

/// Structured record of something the engine did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(rename = "name")]
    pub transaction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl AuditEvent {
    pub fn new(message: impl Into<String>, transaction: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transaction: transaction.into(),
            step: None,
            fields: Fields::new(),
        }
    }

    #[must_use]
    pub fn step(mut self, key: impl Into<String>) -> Self {
        self.step = Some(key.into());
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Append-only destination for audit events.
///
/// Emission is fire-and-forget: a sink that cannot write must swallow the
/// failure rather than affect the run.
pub trait AuditSink: Send + Sync {
    fn emit(&self, level: AuditLevel, event: &AuditEvent);
}

impl<T: AuditSink + ?Sized> AuditSink for Arc<T> {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        (**self).emit(level, event);
    }
}

impl<T: AuditSink + ?Sized> AuditSink for Box<T> {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        (**self).emit(level, event);
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        let step = event.step.as_deref().unwrap_or("-");
        let fields = Value::Object(event.fields.clone());
        match level {
            AuditLevel::Info => tracing::info!(
                transaction = %event.transaction,
                step,
                %fields,
                "{}",
                event.message
            ),
            AuditLevel::Warn => tracing::warn!(
                transaction = %event.transaction,
                step,
                %fields,
                "{}",
                event.message
            ),
            AuditLevel::Error => tracing::error!(
                transaction = %event.transaction,
                step,
                %fields,
                "{}",
                event.message
            ),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<(AuditLevel, AuditEvent)>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<(AuditLevel, AuditEvent)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event messages in emission order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .map(|(_, event)| event.message)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, event.clone()));
    }
}

/// Emits every event to each of several sinks, in order.
#[derive(Default)]
pub struct FanoutAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl FanoutAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: impl AuditSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl AuditSink for FanoutAuditSink {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.emit(level, event);
        }
    }
}
