use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error")]
    Config(#[from] atomic_config::ConfigError),

    #[error("engine setup failed")]
    Engine(#[from] atomic_saga::EngineError),

    #[error("failed to determine current directory")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to read payload file '{path}'")]
    PayloadRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("payload is not valid JSON")]
    PayloadParse(#[source] serde_json::Error),

    #[error("failed to render outcome")]
    Render(#[source] serde_json::Error),

    #[error("transaction '{transaction}' failed: {reason}")]
    RunFailed { transaction: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CliError>;
