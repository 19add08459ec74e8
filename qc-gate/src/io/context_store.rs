//! Quality-cycle context persisted as marker lines in `CLAUDE_ENV_FILE`.
//!
//! The file belongs to the host and may hold arbitrary other lines; only lines
//! starting with [`MARKER_PREFIX`] (and the banner comment written alongside
//! them) are ours. Every rewrite goes through a sibling temp file and an atomic
//! rename, so concurrent readers see either the old or the new content.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::engine::ContextSource;
use crate::core::types::QualityCycleContext;
use crate::io::env::GateEnv;

pub const MARKER_PREFIX: &str = "QUALITY_CYCLE_";
pub const BANNER_TEXT: &str = "Quality Cycle Context";
const ACTIVE_KEY: &str = "QUALITY_CYCLE_ACTIVE";
const AGENT_KEY: &str = "QUALITY_CYCLE_AGENT";
const SESSION_KEY: &str = "QUALITY_CYCLE_SESSION";
const STARTED_KEY: &str = "QUALITY_CYCLE_STARTED";

/// Reasons the store refuses a location.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("CLAUDE_ENV_FILE is not set")]
    Unset,
    #[error("context file {0} is not under an allowed directory")]
    DisallowedLocation(PathBuf),
}

/// Parent directories the context file may live under.
pub fn allowed_roots(home: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = vec![PathBuf::from("/tmp"), std::env::temp_dir()];
    if let Some(home) = home {
        roots.push(home.join(".claude"));
        roots.push(home.join(".config"));
    }
    roots.dedup();
    roots
}

/// Absolute, no `..`, strictly below one of the allowed roots.
pub fn is_allowed_location(path: &Path, home: Option<&Path>) -> bool {
    if !path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
        return false;
    }
    allowed_roots(home)
        .iter()
        .any(|root| path != root && path.starts_with(root))
}

/// Handle to a validated context file location.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    /// Validate `path` against the allow-list before any access.
    pub fn open(path: &Path, home: Option<&Path>) -> Result<Self, StoreError> {
        if !is_allowed_location(path, home) {
            return Err(StoreError::DisallowedLocation(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn from_env(env: &GateEnv) -> Result<Self, StoreError> {
        let path = env.env_file.as_deref().ok_or(StoreError::Unset)?;
        Self::open(path, env.home.as_deref())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current context. A missing file is an inactive context.
    pub fn get(&self) -> Result<QualityCycleContext> {
        let Some(existing) = self.read_bytes()? else {
            return Ok(QualityCycleContext::inactive());
        };
        Ok(parse_markers(&String::from_utf8_lossy(&existing)))
    }

    /// Replace any existing markers with a fresh active context.
    ///
    /// Host lines are kept byte for byte. The marker block goes after them,
    /// or in front when the host content does not end in a newline.
    pub fn set(&self, agent_type: &str, session_id: &str) -> Result<()> {
        let existing = self.read_bytes()?.unwrap_or_default();
        let retained = retained_content(&existing);
        let mut block = format!("# {BANNER_TEXT} - set by session-start\n");
        block.push_str(&format!("{ACTIVE_KEY}=true\n"));
        block.push_str(&format!("{AGENT_KEY}={}\n", single_line(agent_type)));
        block.push_str(&format!("{SESSION_KEY}={}\n", single_line(session_id)));
        block.push_str(&format!(
            "{STARTED_KEY}={}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let mut out = Vec::with_capacity(retained.len() + block.len());
        if retained.is_empty() || retained.ends_with(b"\n") {
            out.extend_from_slice(&retained);
            out.extend_from_slice(block.as_bytes());
        } else {
            out.extend_from_slice(block.as_bytes());
            out.extend_from_slice(&retained);
        }
        self.write_atomic(&out)?;
        debug!(path = %self.path.display(), agent_type, session_id, "context set");
        Ok(())
    }

    /// Remove all markers. Returns `false` when there was nothing to remove.
    pub fn clear(&self) -> Result<bool> {
        let Some(existing) = self.read_bytes()? else {
            return Ok(false);
        };
        if !lines(&existing).any(is_marker_line) {
            return Ok(false);
        }
        self.write_atomic(&retained_content(&existing))?;
        debug!(path = %self.path.display(), "context cleared");
        Ok(true)
    }

    /// Raw file content; `None` when the file does not exist.
    fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("read {}", self.path.display())),
        }
    }

    fn write_atomic(&self, contents: &[u8]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .with_context(|| format!("context path missing parent {}", self.path.display()))?;
        let mut tmp = NamedTempFile::new_in(parent)
            .with_context(|| format!("create temp file in {}", parent.display()))?;
        tmp.write_all(contents).context("write temp context file")?;
        tmp.as_file().sync_all().context("sync temp context file")?;
        copy_permissions(&self.path, tmp.path())?;
        tmp.persist(&self.path)
            .map_err(|err| err.error)
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

impl ContextSource for Option<ContextStore> {
    fn load(&self) -> QualityCycleContext {
        let Some(store) = self else {
            return QualityCycleContext::inactive();
        };
        match store.get() {
            Ok(ctx) => {
                if ctx.active {
                    debug!(agent = ?ctx.agent_type, "quality cycle context detected");
                }
                ctx
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "context store unreadable, treating as inactive");
                QualityCycleContext::inactive()
            }
        }
    }
}

/// Lines including their terminators, so joining them gives back the input.
fn lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content.split_inclusive(|&b| b == b'\n')
}

fn is_marker_line(line: &[u8]) -> bool {
    let banner = BANNER_TEXT.as_bytes();
    line.starts_with(MARKER_PREFIX.as_bytes())
        || line.windows(banner.len()).any(|window| window == banner)
}

/// Non-marker lines, byte for byte, in original order.
fn retained_content(existing: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(existing.len());
    for line in lines(existing).filter(|line| !is_marker_line(line)) {
        out.extend_from_slice(line);
    }
    out
}

fn single_line(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect()
}

fn parse_markers(content: &str) -> QualityCycleContext {
    let mut ctx = QualityCycleContext::inactive();
    for line in content.lines() {
        // Same start-of-line rule as `is_marker_line`, so `clear` removes
        // every line that can make the context active.
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key {
            ACTIVE_KEY => ctx.active = value == "true",
            AGENT_KEY => ctx.agent_type = Some(value.to_string()),
            SESSION_KEY => ctx.session_id = Some(value.to_string()),
            STARTED_KEY => ctx.started = Some(value.to_string()),
            _ => {}
        }
    }
    ctx
}

#[cfg(unix)]
fn copy_permissions(target: &Path, tmp: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match fs::metadata(target) {
        Ok(meta) => meta.permissions().mode() & 0o777,
        Err(_) => 0o644,
    };
    fs::set_permissions(tmp, fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", tmp.display()))
}

#[cfg(not(unix))]
fn copy_permissions(_target: &Path, _tmp: &Path) -> Result<()> {
    Ok(())
}
