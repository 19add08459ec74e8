//! Append-only audit trail for override usage.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::types::AuditEvent;

/// JSON-lines audit file. Writes are best-effort.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Log, echo to stderr and append one event. Never fails.
    pub fn record(&self, event: &AuditEvent) {
        let line = event.render();
        info!(target: "qc_gate::audit", "AUDIT: {line}");
        eprintln!("{line}");
        if let Some(path) = &self.path
            && let Err(err) = append_json_line(path, event)
        {
            warn!(err = %format!("{err:#}"), "failed to append audit event");
        }
    }
}

fn append_json_line(path: &Path, event: &AuditEvent) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create audit dir {}", parent.display()))?;
    }
    let mut line = serde_json::to_string(event).context("serialize audit event")?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("append {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AuditKind;

    #[test]
    fn events_append_as_json_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("logs").join("audit.jsonl");
        let log = AuditLog::new(Some(path.clone()));

        log.record(&AuditEvent::new(AuditKind::QcOverride, "s1", ""));
        log.record(&AuditEvent::new(AuditKind::MainOverride, "s2", "file_branch: main"));

        let contents = fs::read_to_string(&path).expect("read");
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).expect("json"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "qc_override");
        assert_eq!(lines[1]["session_id"], "s2");
        assert_eq!(lines[1]["detail"], "file_branch: main");
    }

    #[test]
    fn unwritable_location_is_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("file");
        fs::write(&blocker, "x").expect("write");
        let log = AuditLog::new(Some(blocker.join("audit.jsonl")));
        log.record(&AuditEvent::new(AuditKind::QcOverride, "s1", ""));
    }
}
