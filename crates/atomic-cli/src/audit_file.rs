use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use atomic_saga::{AuditEvent, AuditLevel, AuditSink};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

pub(crate) const AUDIT_FILE_NAME: &str = "atomic.log";

#[derive(Serialize)]
struct AuditLine<'a> {
    ts: String,
    level: AuditLevel,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Appends one JSON object per audit event to `<dir>/atomic.log`.
///
/// The directory and file are created on first use. Write failures are
/// reported through `tracing` and otherwise ignored.
pub(crate) struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl JsonLinesAuditSink {
    pub(crate) fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(AUDIT_FILE_NAME),
            file: Mutex::new(None),
        }
    }

    fn open(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(self.open()?);
        }
        match guard.as_mut() {
            Some(file) => writeln!(file, "{line}"),
            None => Ok(()),
        }
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn emit(&self, level: AuditLevel, event: &AuditEvent) {
        let line = AuditLine {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level,
            event,
        };
        let result = serde_json::to_string(&line)
            .map_err(std::io::Error::other)
            .and_then(|line| self.write_line(&line));
        if let Err(error) = result {
            warn!(path = %self.path.display(), %error, "failed to write audit log");
        }
    }
}
