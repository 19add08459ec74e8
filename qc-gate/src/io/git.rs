//! Git adapter for branch classification.
//!
//! Every query is a bounded `git -C <dir> ...` subprocess. Failures of any kind
//! (git missing, not a repository, timeout) are reported as errors here and
//! collapse to `NotInRepo` in [`GitBranchClassifier`].

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::branch::{BranchClassifier, classify_branch_name};
use crate::core::types::BranchState;
use crate::io::process::{CommandOutput, run_with_timeout};

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(5);
const OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Wrapper for executing git queries against a directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            workdir: workdir.into(),
            timeout,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// True if `workdir` is inside a git working tree (or git dir).
    pub fn is_repo(&self) -> Result<bool> {
        let out = self.run(&["rev-parse", "--git-dir"])?;
        Ok(out.succeeded())
    }

    /// Short name of the checked-out ref; `HEAD` when detached.
    #[instrument(skip_all)]
    pub fn current_branch(&self) -> Result<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if !out.succeeded() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(anyhow!(
                "git rev-parse --abbrev-ref HEAD failed: {}",
                stderr.trim()
            ));
        }
        let name = out.stdout_lossy().trim().to_string();
        if name.is_empty() {
            return Err(anyhow!("git returned an empty branch name"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.workdir).args(args);
        // Inherited repository overrides would point every query at the same repo.
        cmd.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
        let out = run_with_timeout(cmd, self.timeout, OUTPUT_LIMIT_BYTES)?;
        if out.timed_out {
            return Err(anyhow!("git {} timed out", args.join(" ")));
        }
        Ok(out)
    }
}

/// Nearest directory that exists on disk for a target path.
///
/// An existing file resolves to its parent; a missing path walks upward until
/// some ancestor exists.
pub fn nearest_existing_dir(path: &Path) -> Option<PathBuf> {
    let start = if path.is_file() { path.parent()? } else { path };
    start
        .ancestors()
        .find(|dir| !dir.as_os_str().is_empty() && dir.is_dir())
        .map(Path::to_path_buf)
}

/// [`BranchClassifier`] backed by the real `git` binary.
///
/// The repository is located from the target path, never from the process's
/// working directory, so files in other worktrees classify correctly.
#[derive(Debug, Clone)]
pub struct GitBranchClassifier {
    timeout: Duration,
}

impl GitBranchClassifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn query(&self, path: &Path) -> Result<Option<String>> {
        let Some(dir) = nearest_existing_dir(path) else {
            debug!(path = %path.display(), "no existing ancestor");
            return Ok(None);
        };
        let git = Git::new(dir, self.timeout);
        if !git.is_repo()? {
            debug!(dir = %git.workdir().display(), "not a git repository");
            return Ok(None);
        }
        git.current_branch().map(Some)
    }
}

impl Default for GitBranchClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_TIMEOUT)
    }
}

impl BranchClassifier for GitBranchClassifier {
    fn classify(&self, path: &Path) -> BranchState {
        match self.query(path) {
            Ok(Some(name)) => BranchState {
                class: classify_branch_name(&name),
                name: Some(name),
            },
            Ok(None) => BranchState::not_in_repo(),
            Err(err) => {
                warn!(path = %path.display(), err = %err, "branch query failed, treating as not in repo");
                BranchState::not_in_repo()
            }
        }
    }
}
