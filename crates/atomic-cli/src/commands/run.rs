use std::path::Path;

use atomic_config::AtomicConfig;
use serde_json::Value;

use super::build_engine;
use crate::error::{CliError, Result};

pub(crate) fn run(
    config: &AtomicConfig,
    name: &str,
    payload: Option<&str>,
    payload_file: Option<&Path>,
) -> Result<()> {
    let payload = read_payload(payload, payload_file)?;
    let engine = build_engine(config)?;

    let outcome = engine.run(name, payload);

    let rendered = serde_json::to_string_pretty(&outcome).map_err(CliError::Render)?;
    println!("{rendered}");

    if outcome.is_ok() {
        return Ok(());
    }
    let reason = match outcome.failed_step() {
        Some(step) => format!("step '{step}' failed"),
        None => outcome.error_message().unwrap_or_default(),
    };
    Err(CliError::RunFailed {
        transaction: name.to_string(),
        reason,
    })
}

fn read_payload(payload: Option<&str>, payload_file: Option<&Path>) -> Result<Value> {
    let text = match (payload, payload_file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => {
            std::fs::read_to_string(path).map_err(|source| CliError::PayloadRead {
                path: path.to_path_buf(),
                source,
            })?
        }
        (None, None) => return Ok(Value::Object(serde_json::Map::new())),
    };
    serde_json::from_str(&text).map_err(CliError::PayloadParse)
}
