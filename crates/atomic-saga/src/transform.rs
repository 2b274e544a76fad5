use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::accumulator::Fields;
use crate::definition::{StepMode, TransactionDefinition, TransformRef};
use crate::error::{StepError, TransformError, UnresolvedTransform};
use crate::state::ExecutionRecord;

/// Name of the built-in transform that returns its composed input unchanged.
pub const IDENTITY: &str = "identity";

/// Name of the built-in transform that returns an empty object.
pub const EMPTY: &str = "empty";

/// Read-only view of the run handed to a transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Name of the running transaction.
    pub transaction: &'a str,
    /// Steps completed so far, in completion order.
    pub records: &'a [ExecutionRecord],
    /// Every mapping result merged so far.
    pub chain: &'a Fields,
    /// Results of `get` steps since the last `put` success.
    pub window: &'a Fields,
    /// Resolved mode of the step being prepared.
    pub mode: StepMode,
}

/// Per-step function producing the request payload for a remote call.
///
/// The returned value is the body of non-GET calls and supplies the URL
/// placeholder values when it is an object.
pub trait Transform: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the input cannot be turned into a request payload.
    fn apply(&self, input: Fields, ctx: &TransformContext<'_>) -> Result<Value, TransformError>;
}

struct FnTransform<F>(F);

impl<F> Transform for FnTransform<F>
where
    F: Fn(Fields, &TransformContext<'_>) -> Result<Value, TransformError> + Send + Sync,
{
    fn apply(&self, input: Fields, ctx: &TransformContext<'_>) -> Result<Value, TransformError> {
        (self.0)(input, ctx)
    }
}

struct Identity;

impl Transform for Identity {
    fn apply(&self, input: Fields, _ctx: &TransformContext<'_>) -> Result<Value, TransformError> {
        Ok(Value::Object(input))
    }
}

struct Empty;

impl Transform for Empty {
    fn apply(&self, _input: Fields, _ctx: &TransformContext<'_>) -> Result<Value, TransformError> {
        Ok(Value::Object(Fields::new()))
    }
}

/// Static lookup from transform key to implementation.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Box<dyn Transform>>,
}

impl TransformRegistry {
    /// An empty registry, without built-ins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the `identity` and `empty` built-ins.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(IDENTITY, Identity);
        registry.register(EMPTY, Empty);
        registry
    }

    #[must_use]
    pub fn is_builtin(key: &str) -> bool {
        key == IDENTITY || key == EMPTY
    }

    /// Registers `transform` under `key`, replacing any previous entry.
    pub fn register(&mut self, key: impl Into<String>, transform: impl Transform + 'static) {
        self.transforms.insert(key.into(), Box::new(transform));
    }

    /// Registers a closure under `key`, replacing any previous entry.
    pub fn register_fn<F>(&mut self, key: impl Into<String>, transform: F)
    where
        F: Fn(Fields, &TransformContext<'_>) -> Result<Value, TransformError>
            + Send
            + Sync
            + 'static,
    {
        self.register(key, FnTransform(transform));
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.transforms.contains_key(key)
    }

    /// Sorted keys of every registered transform.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// # Errors
    ///
    /// Returns [`StepError::TransformNotFound`] if nothing is registered
    /// under the reference.
    pub fn resolve(&self, reference: &TransformRef) -> Result<&dyn Transform, StepError> {
        self.transforms
            .get(reference.as_str())
            .map(|transform| &**transform)
            .ok_or_else(|| StepError::TransformNotFound {
                reference: reference.to_string(),
            })
    }

    /// Every step, across the given transactions, whose transform is not registered.
    pub fn unresolved<'a, I>(&self, transactions: I) -> Vec<UnresolvedTransform>
    where
        I: IntoIterator<Item = (&'a str, &'a TransactionDefinition)>,
    {
        transactions
            .into_iter()
            .flat_map(|(name, definition)| {
                definition
                    .steps()
                    .iter()
                    .filter(|step| !self.contains(step.transform().as_str()))
                    .map(move |step| UnresolvedTransform {
                        transaction: name.to_string(),
                        step: step.key().to_string(),
                        reference: step.transform().to_string(),
                    })
            })
            .collect()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
