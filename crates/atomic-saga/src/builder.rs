use indexmap::IndexMap;
use serde_json::Value;

use crate::accumulator::Fields;
use crate::audit::{AuditSink, TracingAuditSink};
use crate::definition::TransactionDefinition;
use crate::engine::Engine;
use crate::error::{EngineError, TransformError};
use crate::remote::RemoteInvoker;
use crate::transform::{Transform, TransformContext, TransformRegistry};

/// Marker for a builder that has no remote invoker yet.
pub struct NoInvoker;

/// Type-state builder for an [`Engine`].
///
/// `build()` only exists once a remote invoker has been supplied, and it
/// refuses to build when any step references a transform that is not
/// registered, so malformed setups are rejected before any run starts.
///
/// An engine without an invoker cannot be built:
///
/// ```compile_fail
/// use atomic_saga::Engine;
///
/// let engine = Engine::builder().build();
/// ```
pub struct EngineBuilder<I> {
    transactions: IndexMap<String, TransactionDefinition>,
    duplicates: Vec<String>,
    transforms: TransformRegistry,
    invoker: I,
    audit: Box<dyn AuditSink>,
}

impl EngineBuilder<NoInvoker> {
    /// A builder with the built-in transforms and a `tracing` audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transactions: IndexMap::new(),
            duplicates: Vec::new(),
            transforms: TransformRegistry::with_builtins(),
            invoker: NoInvoker,
            audit: Box::new(TracingAuditSink),
        }
    }
}

impl Default for EngineBuilder<NoInvoker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> EngineBuilder<I> {
    /// Registers a transaction under `name`.
    #[must_use]
    pub fn transaction(mut self, name: impl Into<String>, definition: TransactionDefinition) -> Self {
        let name = name.into();
        if self.transactions.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.transactions.insert(name, definition);
        }
        self
    }

    #[must_use]
    pub fn transform(mut self, key: impl Into<String>, transform: impl Transform + 'static) -> Self {
        self.transforms.register(key, transform);
        self
    }

    #[must_use]
    pub fn transform_fn<F>(mut self, key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Fields, &TransformContext<'_>) -> Result<Value, TransformError>
            + Send
            + Sync
            + 'static,
    {
        self.transforms.register_fn(key, transform);
        self
    }

    /// Replaces the whole transform registry, built-ins included.
    #[must_use]
    pub fn transforms(mut self, transforms: TransformRegistry) -> Self {
        self.transforms = transforms;
        self
    }

    #[must_use]
    pub fn audit_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.audit = Box::new(sink);
        self
    }

    /// Supplies the remote invoker used for execute and rollback calls.
    #[must_use]
    pub fn invoker<R>(self, invoker: R) -> EngineBuilder<R>
    where
        R: RemoteInvoker + 'static,
    {
        EngineBuilder {
            transactions: self.transactions,
            duplicates: self.duplicates,
            transforms: self.transforms,
            invoker,
            audit: self.audit,
        }
    }
}

impl<I> EngineBuilder<I>
where
    I: RemoteInvoker + 'static,
{
    /// # Errors
    ///
    /// Returns an error if a transaction name was registered twice or any
    /// step references an unregistered transform.
    pub fn build(self) -> Result<Engine, EngineError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(EngineError::DuplicateTransaction(name));
        }

        let unresolved = self.transforms.unresolved(
            self.transactions
                .iter()
                .map(|(name, definition)| (name.as_str(), definition)),
        );
        if !unresolved.is_empty() {
            return Err(EngineError::UnresolvedTransforms(unresolved));
        }

        Ok(Engine::from_parts(
            self.transactions,
            self.transforms,
            Box::new(self.invoker),
            self.audit,
        ))
    }
}
