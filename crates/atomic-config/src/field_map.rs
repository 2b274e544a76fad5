use atomic_saga::{Fields, Transform, TransformContext, TransformError};
use indexmap::IndexMap;
use serde_json::Value;

/// Transform declared in configuration as a mapping of input fields.
///
/// The output is built from scratch: `pick` copies fields under their own
/// name, `rename` copies `source` fields under a new name and `defaults`
/// fill whatever is still missing or null. Fields named in `require` must be
/// present and non-null in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMapTransform {
    require: Vec<String>,
    pick: Vec<String>,
    rename: IndexMap<String, String>,
    defaults: Fields,
}

impl FieldMapTransform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.require.push(field.into());
        self
    }

    #[must_use]
    pub fn pick(mut self, field: impl Into<String>) -> Self {
        self.pick.push(field.into());
        self
    }

    #[must_use]
    pub fn rename(mut self, target: impl Into<String>, source: impl Into<String>) -> Self {
        self.rename.insert(target.into(), source.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(field.into(), value.into());
        self
    }

    pub(crate) fn from_parts(
        require: Vec<String>,
        pick: Vec<String>,
        rename: IndexMap<String, String>,
        defaults: Fields,
    ) -> Self {
        Self {
            require,
            pick,
            rename,
            defaults,
        }
    }
}

fn present<'a>(input: &'a Fields, field: &str) -> Option<&'a Value> {
    input.get(field).filter(|value| !value.is_null())
}

impl Transform for FieldMapTransform {
    fn apply(&self, input: Fields, _ctx: &TransformContext<'_>) -> Result<Value, TransformError> {
        if let Some(missing) = self.require.iter().find(|field| present(&input, field).is_none()) {
            return Err(TransformError::new(format!("missing required field '{missing}'")));
        }

        let mut output = Fields::new();
        for field in &self.pick {
            if let Some(value) = input.get(field) {
                output.insert(field.clone(), value.clone());
            }
        }
        for (target, source) in &self.rename {
            if let Some(value) = input.get(source) {
                output.insert(target.clone(), value.clone());
            }
        }
        for (field, value) in &self.defaults {
            if output.get(field).is_none_or(Value::is_null) {
                output.insert(field.clone(), value.clone());
            }
        }
        Ok(Value::Object(output))
    }
}
