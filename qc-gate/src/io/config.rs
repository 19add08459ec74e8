//! Optional gate configuration at `~/.claude/qc-gate.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = "qc-gate.toml";

/// Gate configuration (TOML).
///
/// Only operational knobs live here; the protection rules are fixed. Missing
/// fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Per-query deadline for `git` subprocesses.
    pub git_timeout_secs: u64,

    /// Debug log location (default `~/.claude/logs/hooks-debug.log`).
    pub debug_log: Option<PathBuf>,

    /// Audit log location (default `~/.claude/logs/qc-audit.jsonl`).
    pub audit_log: Option<PathBuf>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            git_timeout_secs: 5,
            debug_log: None,
            audit_log: None,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.git_timeout_secs == 0 {
            return Err(anyhow!("git_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    pub fn debug_log_path(&self, claude_dir: Option<&Path>) -> Option<PathBuf> {
        self.debug_log
            .clone()
            .or_else(|| claude_dir.map(|dir| dir.join("logs").join("hooks-debug.log")))
    }

    pub fn audit_log_path(&self, claude_dir: Option<&Path>) -> Option<PathBuf> {
        self.audit_log
            .clone()
            .or_else(|| claude_dir.map(|dir| dir.join("logs").join("qc-audit.jsonl")))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GateConfig::default()`.
pub fn load_config(path: &Path) -> Result<GateConfig> {
    if !path.exists() {
        return Ok(GateConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GateConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load config from `claude_dir`, falling back to defaults on any problem.
///
/// A broken config file must not change a verdict, so errors are only logged.
pub fn load_or_default(claude_dir: Option<&Path>) -> GateConfig {
    let Some(dir) = claude_dir else {
        return GateConfig::default();
    };
    match load_config(&dir.join(CONFIG_FILE_NAME)) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "ignoring invalid gate config");
            GateConfig::default()
        }
    }
}
