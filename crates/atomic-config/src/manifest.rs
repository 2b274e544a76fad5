use std::path::Path;

use atomic_saga::Fields;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize, Default)]
pub(crate) struct AtomicManifest {
    #[serde(default)]
    pub(crate) settings: SettingsSection,
    #[serde(default)]
    pub(crate) transforms: IndexMap<String, FieldMapSection>,
    #[serde(default)]
    pub(crate) transactions: IndexMap<String, TransactionSection>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct SettingsSection {
    #[serde(rename = "log-dir")]
    pub(crate) log_dir: Option<String>,
    #[serde(rename = "timeout-ms")]
    pub(crate) timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FieldMapSection {
    #[serde(default)]
    pub(crate) require: Vec<String>,
    #[serde(default)]
    pub(crate) pick: Vec<String>,
    #[serde(default)]
    pub(crate) rename: IndexMap<String, String>,
    #[serde(default)]
    pub(crate) defaults: Fields,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionSection {
    #[serde(default)]
    pub(crate) steps: Vec<StepSection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StepSection {
    pub(crate) key: String,
    pub(crate) transform: String,
    pub(crate) mode: Option<String>,
    pub(crate) execute: CallSection,
    pub(crate) rollback: CallSection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallSection {
    pub(crate) method: String,
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) headers: IndexMap<String, String>,
}

pub(crate) fn read_manifest(path: &Path) -> Result<AtomicManifest, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content, path)
}

pub(crate) fn parse_manifest(content: &str, path: &Path) -> Result<AtomicManifest, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
