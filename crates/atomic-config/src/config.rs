use std::path::{Path, PathBuf};
use std::time::Duration;

use atomic_saga::{
    ApiCallDef, Engine, EngineBuilder, HttpMethod, NoInvoker, StepDefinition, StepMode,
    TransactionDefinition, TransformRegistry,
};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::ConfigError;
use crate::field_map::FieldMapTransform;
use crate::manifest::{
    AtomicManifest, CallSection, SettingsSection, StepSection, parse_manifest, read_manifest,
};
use crate::{CONFIG_FILE_NAME, DEFAULT_LOG_DIR, DEFAULT_TIMEOUT_MS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    log_dir: PathBuf,
    timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl Settings {
    /// Audit log directory as written in the file, possibly relative.
    #[must_use]
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Validated contents of an `Atomic.toml` file.
#[derive(Debug, Clone)]
pub struct AtomicConfig {
    path: PathBuf,
    settings: Settings,
    transforms: IndexMap<String, FieldMapTransform>,
    transactions: IndexMap<String, TransactionDefinition>,
}

impl AtomicConfig {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the config file.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Audit log directory, resolved against [`AtomicConfig::root`] when relative.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.root().join(self.settings.log_dir())
    }

    #[must_use]
    pub fn transforms(&self) -> &IndexMap<String, FieldMapTransform> {
        &self.transforms
    }

    #[must_use]
    pub fn transactions(&self) -> &IndexMap<String, TransactionDefinition> {
        &self.transactions
    }

    /// Engine builder preloaded with every transaction and declared transform.
    ///
    /// Hosts add closure transforms, an audit sink and an invoker before
    /// building.
    #[must_use]
    pub fn engine_builder(&self) -> EngineBuilder<NoInvoker> {
        let builder = self
            .transforms
            .iter()
            .fold(Engine::builder(), |builder, (name, transform)| {
                builder.transform(name.as_str(), transform.clone())
            });
        self.transactions
            .iter()
            .fold(builder, |builder, (name, definition)| {
                builder.transaction(name.as_str(), definition.clone())
            })
    }
}

/// Walks upward from `start_dir` to the nearest directory holding an
/// `Atomic.toml`.
///
/// # Errors
///
/// Returns `ConfigError::NotFound` if no ancestor holds the file, or
/// `ConfigError::Read` if `start_dir` cannot be resolved.
pub fn find_config_file(start_dir: &Path) -> Result<PathBuf, ConfigError> {
    let start_dir = start_dir
        .canonicalize()
        .map_err(|source| ConfigError::Read {
            path: start_dir.to_path_buf(),
            source,
        })?;

    let mut current = start_dir.as_path();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Ok(candidate);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Err(ConfigError::NotFound { start_dir }),
        }
    }
}

/// # Errors
///
/// Returns `ConfigError` if no config file is found or if it is invalid.
pub fn discover_config(start_dir: &Path) -> Result<AtomicConfig, ConfigError> {
    let path = find_config_file(start_dir)?;
    load_config(&path)
}

/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed or validated.
pub fn load_config(path: &Path) -> Result<AtomicConfig, ConfigError> {
    let manifest = read_manifest(path)?;
    build_config(manifest, path)
}

/// Parses and validates config text as if it had been read from `path`.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not valid TOML or fails validation.
pub fn parse_config(content: &str, path: &Path) -> Result<AtomicConfig, ConfigError> {
    let manifest = parse_manifest(content, path)?;
    build_config(manifest, path)
}

fn build_config(manifest: AtomicManifest, path: &Path) -> Result<AtomicConfig, ConfigError> {
    let settings = build_settings(&manifest.settings)?;

    let mut transforms = IndexMap::new();
    for (name, section) in manifest.transforms {
        if TransformRegistry::is_builtin(&name) {
            return Err(ConfigError::BuiltinTransform { name });
        }
        let transform = FieldMapTransform::from_parts(
            section.require,
            section.pick,
            section.rename,
            section.defaults,
        );
        transforms.insert(name, transform);
    }

    let mut transactions = IndexMap::new();
    for (name, section) in manifest.transactions {
        let steps = section
            .steps
            .into_iter()
            .map(|step| build_step(&name, step))
            .collect::<Result<Vec<_>, _>>()?;
        let definition = TransactionDefinition::new(steps).map_err(|source| {
            ConfigError::InvalidTransaction {
                transaction: name.clone(),
                source,
            }
        })?;
        transactions.insert(name, definition);
    }

    debug!(
        path = %path.display(),
        transactions = transactions.len(),
        transforms = transforms.len(),
        "loaded config"
    );

    Ok(AtomicConfig {
        path: path.to_path_buf(),
        settings,
        transforms,
        transactions,
    })
}

fn build_settings(section: &SettingsSection) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let timeout = match section.timeout_ms {
        Some(0) => return Err(ConfigError::InvalidTimeout { timeout_ms: 0 }),
        Some(ms) => Duration::from_millis(ms),
        None => defaults.timeout,
    };
    Ok(Settings {
        log_dir: section
            .log_dir
            .as_ref()
            .map_or(defaults.log_dir, PathBuf::from),
        timeout,
    })
}

fn build_step(transaction: &str, section: StepSection) -> Result<StepDefinition, ConfigError> {
    let execute = build_call(transaction, &section.key, section.execute)?;
    let rollback = build_call(transaction, &section.key, section.rollback)?;
    let mode = section
        .mode
        .map(|mode| {
            mode.parse::<StepMode>()
                .map_err(|_| ConfigError::InvalidMode {
                    transaction: transaction.to_string(),
                    step: section.key.clone(),
                    mode,
                })
        })
        .transpose()?;

    let step = StepDefinition::new(section.key, execute, rollback, section.transform);
    Ok(match mode {
        Some(mode) => step.with_mode(mode),
        None => step,
    })
}

fn build_call(transaction: &str, step: &str, section: CallSection) -> Result<ApiCallDef, ConfigError> {
    let method = section
        .method
        .parse::<HttpMethod>()
        .map_err(|_| ConfigError::InvalidMethod {
            transaction: transaction.to_string(),
            step: step.to_string(),
            method: section.method.clone(),
        })?;
    Ok(section
        .headers
        .into_iter()
        .fold(ApiCallDef::new(method, section.url), |call, (name, value)| {
            call.with_header(name, value)
        }))
}
