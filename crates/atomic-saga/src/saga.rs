use serde_json::Value;

use crate::accumulator::Fields;
use crate::audit::{AuditEvent, AuditLevel, AuditSink};
use crate::definition::{StepDefinition, TransactionDefinition};
use crate::error::StepError;
use crate::executor::{StepExecutor, StepOutcome};
use crate::outcome::{RunOutcome, StepResult};
use crate::remote::RemoteInvoker;
use crate::rollback::RollbackCoordinator;
use crate::state::RunState;
use crate::transform::TransformRegistry;

/// One transaction bound to its collaborators, ready to run.
///
/// Steps run strictly in declared order. On the first failure, every step
/// that already succeeded is compensated in reverse (LIFO) order and the
/// run returns the failure envelope with the rollback report.
pub struct Saga<'a> {
    name: &'a str,
    definition: &'a TransactionDefinition,
    transforms: &'a TransformRegistry,
    invoker: &'a dyn RemoteInvoker,
    audit: &'a dyn AuditSink,
}

impl<'a> Saga<'a> {
    #[must_use]
    pub fn new(
        name: &'a str,
        definition: &'a TransactionDefinition,
        transforms: &'a TransformRegistry,
        invoker: &'a dyn RemoteInvoker,
        audit: &'a dyn AuditSink,
    ) -> Self {
        Self {
            name,
            definition,
            transforms,
            invoker,
            audit,
        }
    }

    /// Runs the transaction with `payload` as the original input.
    #[must_use]
    pub fn run(&self, payload: Fields) -> RunOutcome {
        self.audit.emit(
            AuditLevel::Info,
            &AuditEvent::new("Transaction start", self.name).field(
                "steps",
                Value::from(self.definition.step_keys()),
            ),
        );

        let executor = StepExecutor::new(self.name, self.transforms, self.invoker, self.audit);
        let mut state = RunState::new(payload);
        for step in self.definition.steps() {
            match executor.execute(state, step) {
                StepOutcome::Succeeded(next) => state = next,
                StepOutcome::Failed { state, error } => return self.abort(&state, step, error),
            }
        }

        self.audit.emit(
            AuditLevel::Info,
            &AuditEvent::new("Transaction success", self.name),
        );
        RunOutcome::Completed {
            transaction: self.name.to_string(),
            results: state.records().iter().map(StepResult::from).collect(),
        }
    }

    fn abort(&self, state: &RunState, step: &StepDefinition, error: StepError) -> RunOutcome {
        self.audit.emit(
            AuditLevel::Error,
            &AuditEvent::new("Step failed", self.name)
                .step(step.key())
                .field("error", error.to_string()),
        );

        let chain_snapshot = state.accumulators().chain().clone();
        let rollback = RollbackCoordinator::new(self.name, self.invoker, self.audit)
            .rollback(state.records(), &chain_snapshot);

        let failed = rollback.iter().filter(|entry| !entry.ok).count();
        self.audit.emit(
            AuditLevel::Warn,
            &AuditEvent::new("Transaction rolled back", self.name)
                .step(step.key())
                .field("attempted", rollback.len())
                .field("failed", failed),
        );

        RunOutcome::Aborted {
            transaction: self.name.to_string(),
            failed_step: step.key().to_string(),
            error,
            rollback,
        }
    }
}
