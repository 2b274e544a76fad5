use crate::definition::{HttpMethod, StepDefinition, StepMode};

/// Resolves the accumulator mode of a step.
///
/// An explicit mode always wins, even when it contradicts the HTTP method.
/// Otherwise `GET` steps are `get` and everything else is `put`.
#[must_use]
pub fn resolve_mode(step: &StepDefinition) -> StepMode {
    if let Some(mode) = step.mode() {
        return mode;
    }
    match step.execute().method() {
        HttpMethod::Get => StepMode::Get,
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch | HttpMethod::Delete => {
            StepMode::Put
        }
    }
}
