use std::path::PathBuf;

use atomic_saga::DefinitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no Atomic.toml found traversing from '{start_dir}'")]
    NotFound { start_dir: PathBuf },

    #[error("failed to read config at '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid timeout-ms {timeout_ms}: must be greater than zero")]
    InvalidTimeout { timeout_ms: u64 },

    #[error("invalid HTTP method '{method}' in step '{step}' of transaction '{transaction}'")]
    InvalidMethod {
        transaction: String,
        step: String,
        method: String,
    },

    #[error("invalid mode '{mode}' in step '{step}' of transaction '{transaction}'")]
    InvalidMode {
        transaction: String,
        step: String,
        mode: String,
    },

    #[error("invalid definition for transaction '{transaction}'")]
    InvalidTransaction {
        transaction: String,
        #[source]
        source: DefinitionError,
    },

    #[error("transform '{name}' shadows a built-in transform")]
    BuiltinTransform { name: String },
}
