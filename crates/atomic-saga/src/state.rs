use serde_json::Value;

use crate::accumulator::{Accumulators, Fields};
use crate::definition::{StepDefinition, StepMode};

/// Record of one successfully completed step.
///
/// Records are appended in completion order and never change afterwards;
/// rollback consumes them in reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRecord {
    step: StepDefinition,
    mode: StepMode,
    result: Value,
    vars: Value,
}

impl ExecutionRecord {
    #[must_use]
    pub fn step(&self) -> &StepDefinition {
        &self.step
    }

    #[must_use]
    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Parsed response of the execute call.
    #[must_use]
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Transform output that was sent with the execute call.
    #[must_use]
    pub fn vars(&self) -> &Value {
        &self.vars
    }
}

/// Everything one run owns: the original payload, the accumulators, and the
/// records of completed steps.
///
/// State moves through the run by value; each step consumes the previous
/// state and hands back the next one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    payload: Fields,
    accumulators: Accumulators,
    records: Vec<ExecutionRecord>,
}

impl RunState {
    #[must_use]
    pub fn new(payload: Fields) -> Self {
        Self {
            payload,
            accumulators: Accumulators::new(),
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn payload(&self) -> &Fields {
        &self.payload
    }

    #[must_use]
    pub fn accumulators(&self) -> &Accumulators {
        &self.accumulators
    }

    #[must_use]
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Appends the step's record and folds its result into the accumulators.
    #[must_use]
    pub fn record_success(
        mut self,
        step: &StepDefinition,
        mode: StepMode,
        result: Value,
        vars: Value,
    ) -> Self {
        self.accumulators = self.accumulators.absorb(&result, mode);
        self.records.push(ExecutionRecord {
            step: step.clone(),
            mode,
            result,
            vars,
        });
        self
    }
}
