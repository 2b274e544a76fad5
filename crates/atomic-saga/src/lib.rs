//! Saga engine for sequences of remote calls.
//!
//! A transaction is a fixed, ordered list of steps. Each step turns the
//! accumulated state of the run into a remote call through a registered
//! transform, and the results are merged back for the steps that follow.
//! When a step fails, every step that already succeeded is compensated in
//! reverse order with its rollback call, on a best-effort basis.

mod accumulator;
mod audit;
mod builder;
mod definition;
mod engine;
mod error;
mod executor;
mod mode;
mod outcome;
mod remote;
mod rollback;
mod saga;
mod state;
mod template;
mod transform;

pub use accumulator::{Accumulators, Fields};
pub use audit::{
    AuditEvent, AuditLevel, AuditSink, FanoutAuditSink, MemoryAuditSink, TracingAuditSink,
};
pub use builder::{EngineBuilder, NoInvoker};
pub use definition::{
    ApiCallDef, HttpMethod, StepDefinition, StepMode, TransactionDefinition, TransformRef,
};
pub use engine::Engine;
pub use error::{
    DefinitionError, EngineError, RemoteCallError, StepError, TransformError, UnresolvedTransform,
};
pub use executor::{StepExecutor, StepOutcome};
pub use mode::resolve_mode;
pub use outcome::{RunOutcome, StepResult};
pub use remote::{RemoteCall, RemoteInvoker};
pub use rollback::{RollbackCoordinator, RollbackEntry, rollback_vars};
pub use saga::Saga;
pub use state::{ExecutionRecord, RunState};
pub use template::template_url;
pub use transform::{Transform, TransformContext, TransformRegistry};
