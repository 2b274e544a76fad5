mod check;
mod list;
mod run;

use std::path::PathBuf;

use atomic_config::AtomicConfig;
use atomic_http::HttpInvoker;
use atomic_saga::{Engine, FanoutAuditSink, TracingAuditSink};
use clap::Subcommand;

use crate::audit_file::JsonLinesAuditSink;
use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a transaction and print its outcome as JSON
    Run {
        /// Transaction name
        name: String,

        /// Input payload as a JSON object
        #[arg(long, conflicts_with = "payload_file")]
        payload: Option<String>,

        /// Read the input payload from a JSON file
        #[arg(long)]
        payload_file: Option<PathBuf>,
    },
    /// List transactions and their steps
    List,
    /// Validate configuration and transform references
    Check,
}

impl Commands {
    pub(crate) fn execute(self, config: &AtomicConfig) -> Result<()> {
        match self {
            Self::Run {
                name,
                payload,
                payload_file,
            } => run::run(config, &name, payload.as_deref(), payload_file.as_deref()),
            Self::List => {
                list::run(config);
                Ok(())
            }
            Self::Check => check::run(config),
        }
    }
}

/// Engine over HTTP that audits to `tracing` and to the config's log directory.
fn build_engine(config: &AtomicConfig) -> Result<Engine> {
    let audit = FanoutAuditSink::new()
        .with(TracingAuditSink)
        .with(JsonLinesAuditSink::new(&config.log_dir()));
    Ok(config
        .engine_builder()
        .audit_sink(audit)
        .invoker(HttpInvoker::with_timeout(config.settings().timeout()))
        .build()?)
}
