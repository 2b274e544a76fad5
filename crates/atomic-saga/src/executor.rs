use serde_json::Value;
use tracing::debug;

use crate::audit::{AuditEvent, AuditLevel, AuditSink};
use crate::definition::{StepDefinition, StepMode};
use crate::error::StepError;
use crate::mode::resolve_mode;
use crate::remote::{RemoteCall, RemoteInvoker};
use crate::state::RunState;
use crate::template::template_url;
use crate::transform::{TransformContext, TransformRegistry};

/// Result of running one step against a run state.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step succeeded; the state now holds its record and merged result.
    Succeeded(RunState),
    /// The step failed; the state is exactly what it was before the step.
    Failed { state: RunState, error: StepError },
}

/// Runs single steps: resolve, compose, transform, template, invoke, merge.
pub struct StepExecutor<'a> {
    transaction: &'a str,
    transforms: &'a TransformRegistry,
    invoker: &'a dyn RemoteInvoker,
    audit: &'a dyn AuditSink,
}

impl<'a> StepExecutor<'a> {
    #[must_use]
    pub fn new(
        transaction: &'a str,
        transforms: &'a TransformRegistry,
        invoker: &'a dyn RemoteInvoker,
        audit: &'a dyn AuditSink,
    ) -> Self {
        Self {
            transaction,
            transforms,
            invoker,
            audit,
        }
    }

    /// Runs `step` against `state` and returns the next state or the failure.
    #[must_use]
    pub fn execute(&self, state: RunState, step: &StepDefinition) -> StepOutcome {
        let mode = resolve_mode(step);
        match self.invoke_step(&state, step, mode) {
            Ok((result, vars)) => {
                let state = state.record_success(step, mode, result, vars);
                self.audit.emit(
                    AuditLevel::Info,
                    &AuditEvent::new("Step succeeded", self.transaction)
                        .step(step.key())
                        .field("mode", mode.as_str()),
                );
                StepOutcome::Succeeded(state)
            }
            Err(error) => StepOutcome::Failed { state, error },
        }
    }

    fn invoke_step(
        &self,
        state: &RunState,
        step: &StepDefinition,
        mode: StepMode,
    ) -> Result<(Value, Value), StepError> {
        let transform = self.transforms.resolve(step.transform())?;

        let accumulators = state.accumulators();
        let input = accumulators.compose_input(state.payload(), mode);
        debug!(
            step = step.key(),
            %mode,
            input_keys = input.len(),
            "composed transform input"
        );
        let ctx = TransformContext {
            transaction: self.transaction,
            records: state.records(),
            chain: accumulators.chain(),
            window: accumulators.window(),
            mode,
        };
        let output = transform
            .apply(input, &ctx)
            .map_err(|error| StepError::Transform {
                reference: step.transform().to_string(),
                error,
            })?;

        let execute = step.execute();
        let url = template_url(execute.url(), &accumulators.execute_vars(&output));
        self.audit.emit(
            AuditLevel::Info,
            &AuditEvent::new("Step execute", self.transaction)
                .step(step.key())
                .field("url", url.as_str())
                .field("method", execute.method().as_str())
                .field("mode", mode.as_str()),
        );

        let call = RemoteCall::new(execute, url, &output);
        let result = self.invoker.invoke(&call)?;
        Ok((result, output))
    }
}
