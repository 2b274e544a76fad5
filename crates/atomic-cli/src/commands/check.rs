use atomic_config::AtomicConfig;
use atomic_saga::EngineError;

use super::build_engine;
use crate::error::{CliError, Result};

pub(crate) fn run(config: &AtomicConfig) -> Result<()> {
    let engine = match build_engine(config) {
        Ok(engine) => engine,
        Err(error) => {
            if let CliError::Engine(EngineError::UnresolvedTransforms(unresolved)) = &error {
                for entry in unresolved {
                    eprintln!("  {entry}");
                }
            }
            return Err(error);
        }
    };

    let steps: usize = engine
        .transactions()
        .map(|(_, definition)| definition.steps().len())
        .sum();
    println!(
        "ok: {} transaction(s), {} step(s), {} declared transform(s) in {}",
        engine.transaction_names().len(),
        steps,
        config.transforms().len(),
        config.path().display(),
    );
    Ok(())
}
