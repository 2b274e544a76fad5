use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::accumulator::Fields;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder pattern is a valid regex")
});

/// Substitutes `:name` placeholders in `url` with values from `vars`.
///
/// Placeholders without a value, or whose value is `null`, are left in the
/// URL verbatim, colon included. Strings are inserted as-is; other values
/// use their JSON text.
#[must_use]
pub fn template_url(url: &str, vars: &Fields) -> String {
    PLACEHOLDER
        .replace_all(url, |caps: &Captures<'_>| {
            vars.get(&caps[1])
                .and_then(placeholder_text)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn placeholder_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
