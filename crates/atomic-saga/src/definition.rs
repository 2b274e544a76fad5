use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::DefinitionError;

/// HTTP verb of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether calls with this method send a request body.
    #[must_use]
    pub fn carries_body(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Get,
            Self::Post,
            Self::Put,
            Self::Patch,
            Self::Delete,
        ]
        .into_iter()
        .find(|method| method.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| DefinitionError::UnknownMethod(s.to_string()))
    }
}

/// How a step's result participates in the accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepMode {
    /// State-producing; a success closes the GET window.
    Put,
    /// Read-only; results accumulate into the GET window.
    Get,
    /// Results reach the chain accumulator only.
    Noop,
}

impl StepMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Put => "put",
            Self::Get => "get",
            Self::Noop => "noop",
        }
    }
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepMode {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "put" => Ok(Self::Put),
            "get" => Ok(Self::Get),
            "noop" => Ok(Self::Noop),
            _ => Err(DefinitionError::UnknownMode(s.to_string())),
        }
    }
}

/// A remote call template: method, URL with `:name` placeholders, and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCallDef {
    method: HttpMethod,
    url: String,
    headers: IndexMap<String, String>,
}

impl ApiCallDef {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }
}

/// Key of a registered transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformRef(String);

impl TransformRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransformRef {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for TransformRef {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// One step of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    key: String,
    execute: ApiCallDef,
    rollback: ApiCallDef,
    transform: TransformRef,
    mode: Option<StepMode>,
}

impl StepDefinition {
    pub fn new(
        key: impl Into<String>,
        execute: ApiCallDef,
        rollback: ApiCallDef,
        transform: impl Into<TransformRef>,
    ) -> Self {
        Self {
            key: key.into(),
            execute,
            rollback,
            transform: transform.into(),
            mode: None,
        }
    }

    /// Pins the step's mode instead of inferring it from the execute method.
    #[must_use]
    pub fn with_mode(mut self, mode: StepMode) -> Self {
        self.mode = Some(mode);
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn execute(&self) -> &ApiCallDef {
        &self.execute
    }

    #[must_use]
    pub fn rollback(&self) -> &ApiCallDef {
        &self.rollback
    }

    #[must_use]
    pub fn transform(&self) -> &TransformRef {
        &self.transform
    }

    /// The explicitly configured mode, if any.
    #[must_use]
    pub fn mode(&self) -> Option<StepMode> {
        self.mode
    }
}

/// A validated, fixed sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDefinition {
    steps: Vec<StepDefinition>,
}

impl TransactionDefinition {
    /// # Errors
    ///
    /// Returns an error if there are no steps, a key is empty or repeated,
    /// or a step has an empty execute or rollback URL.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, DefinitionError> {
        if steps.is_empty() {
            return Err(DefinitionError::NoSteps);
        }

        let mut seen = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            if step.key.trim().is_empty() {
                return Err(DefinitionError::EmptyKey { index });
            }
            if !seen.insert(step.key.as_str()) {
                return Err(DefinitionError::DuplicateKey {
                    key: step.key.clone(),
                });
            }
            for (call, def) in [("execute", &step.execute), ("rollback", &step.rollback)] {
                if def.url.trim().is_empty() {
                    return Err(DefinitionError::EmptyUrl {
                        key: step.key.clone(),
                        call,
                    });
                }
            }
        }

        Ok(Self { steps })
    }

    #[must_use]
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    #[must_use]
    pub fn step_keys(&self) -> Vec<&str> {
        self.steps.iter().map(StepDefinition::key).collect()
    }
}
