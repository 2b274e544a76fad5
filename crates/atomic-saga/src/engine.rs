use indexmap::IndexMap;
use serde_json::Value;

use crate::accumulator::Fields;
use crate::audit::{AuditEvent, AuditLevel, AuditSink};
use crate::builder::{EngineBuilder, NoInvoker};
use crate::definition::TransactionDefinition;
use crate::outcome::RunOutcome;
use crate::remote::RemoteInvoker;
use crate::saga::Saga;
use crate::transform::TransformRegistry;

/// Registry of named transactions and the collaborators that run them.
///
/// The engine holds no per-run state: every call to [`Engine::run`] owns its
/// own accumulators and records, so one engine can serve concurrent runs
/// from several threads.
pub struct Engine {
    transactions: IndexMap<String, TransactionDefinition>,
    transforms: TransformRegistry,
    invoker: Box<dyn RemoteInvoker>,
    audit: Box<dyn AuditSink>,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder<NoInvoker> {
        EngineBuilder::new()
    }

    pub(crate) fn from_parts(
        transactions: IndexMap<String, TransactionDefinition>,
        transforms: TransformRegistry,
        invoker: Box<dyn RemoteInvoker>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            transactions,
            transforms,
            invoker,
            audit,
        }
    }

    /// Runs the transaction registered under `name`.
    ///
    /// A payload that is not a JSON object is treated as an empty one.
    #[must_use]
    pub fn run(&self, name: &str, payload: Value) -> RunOutcome {
        let Some(definition) = self.transactions.get(name) else {
            self.audit.emit(
                AuditLevel::Warn,
                &AuditEvent::new("Transaction not found", name),
            );
            return RunOutcome::UnknownTransaction {
                name: name.to_string(),
            };
        };

        let payload = match payload {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        };

        Saga::new(
            name,
            definition,
            &self.transforms,
            &*self.invoker,
            &*self.audit,
        )
        .run(payload)
    }

    #[must_use]
    pub fn transaction(&self, name: &str) -> Option<&TransactionDefinition> {
        self.transactions.get(name)
    }

    /// Registered transactions in registration order.
    pub fn transactions(&self) -> impl Iterator<Item = (&str, &TransactionDefinition)> {
        self.transactions
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    #[must_use]
    pub fn transaction_names(&self) -> Vec<&str> {
        self.transactions.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }
}
