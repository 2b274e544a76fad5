use serde_json::{Map, Value};
use tracing::debug;

use crate::definition::StepMode;

/// A keyed JSON mapping, the unit every accumulator merges.
pub type Fields = Map<String, Value>;

/// Run-scoped merge state.
///
/// `chain` holds every mapping result merged so far. `window` holds the
/// results of `get` steps since the last successful `put` step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    chain: Fields,
    window: Fields,
}

impl Accumulators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn chain(&self) -> &Fields {
        &self.chain
    }

    #[must_use]
    pub fn window(&self) -> &Fields {
        &self.window
    }

    /// Input handed to a step's transform: the original payload, then the
    /// chain, then (for `put` steps only) the window. Later layers win.
    #[must_use]
    pub fn compose_input(&self, payload: &Fields, mode: StepMode) -> Fields {
        let mut input = payload.clone();
        merge_into(&mut input, &self.chain);
        if mode == StepMode::Put {
            merge_into(&mut input, &self.window);
        }
        input
    }

    /// Variables for the execute URL: chain, window, then the transform output.
    #[must_use]
    pub fn execute_vars(&self, output: &Value) -> Fields {
        let mut vars = self.chain.clone();
        merge_into(&mut vars, &self.window);
        if let Value::Object(fields) = output {
            merge_into(&mut vars, fields);
        }
        vars
    }

    /// Folds a successful step result into the accumulators.
    ///
    /// Only mapping results are merged. A `put` step always closes the window.
    #[must_use]
    pub fn absorb(mut self, result: &Value, mode: StepMode) -> Self {
        if let Value::Object(fields) = result {
            merge_into(&mut self.chain, fields);
            if mode == StepMode::Get {
                merge_into(&mut self.window, fields);
            }
        }
        if mode == StepMode::Put {
            self.window.clear();
        }
        debug!(
            %mode,
            chain_keys = self.chain.len(),
            window_keys = self.window.len(),
            "absorbed step result"
        );
        self
    }
}

/// Merges `source` over `target`, last write wins.
pub fn merge_into(target: &mut Fields, source: &Fields) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
