//! Test-only helpers: scratch git repositories and request documents.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tempfile::TempDir;

/// A throwaway git repository with one empty commit.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a repository whose HEAD points at `branch`.
    pub fn on_branch(branch: &str) -> Result<Self> {
        let dir = tempfile::tempdir().context("tempdir")?;
        let repo = Self { dir };
        repo.git(&["init", "-q"])?;
        let head = format!("refs/heads/{branch}");
        repo.git(&["symbolic-ref", "HEAD", &head])?;
        repo.git(&[
            "-c",
            "user.name=qc-gate",
            "-c",
            "user.email=qc-gate@example.invalid",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "--allow-empty",
            "-m",
            "init",
        ])?;
        Ok(repo)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn checkout_new(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", "-q", "-b", branch])
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .status()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if !status.success() {
            return Err(anyhow!("git {} failed", args.join(" ")));
        }
        Ok(())
    }
}

/// PreToolUse document for an `Edit` of `file_path`.
pub fn edit_request(session_id: &str, cwd: &Path, file_path: &Path) -> String {
    json!({
        "tool_name": "Edit",
        "session_id": session_id,
        "cwd": cwd,
        "tool_input": { "file_path": file_path, "old_string": "a", "new_string": "b" },
    })
    .to_string()
}

/// PreToolUse document for a `Bash` command.
pub fn bash_request(session_id: &str, cwd: &Path, command: &str) -> String {
    json!({
        "tool_name": "Bash",
        "session_id": session_id,
        "cwd": cwd,
        "tool_input": { "command": command },
    })
    .to_string()
}

/// SessionStart document.
pub fn session_start_request(session_id: &str, cwd: &Path) -> String {
    json!({ "session_id": session_id, "cwd": cwd }).to_string()
}

/// `~/.claude` layout under a scratch home directory.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("tempdir")?;
        std::fs::create_dir_all(dir.path().join(".claude"))
            .context("create .claude directory")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn env_file(&self) -> PathBuf {
        self.path().join(".claude").join("session.env")
    }

    pub fn debug_log(&self) -> PathBuf {
        self.path().join(".claude").join("logs").join("hooks-debug.log")
    }

    pub fn audit_log(&self) -> PathBuf {
        self.path().join(".claude").join("logs").join("qc-audit.jsonl")
    }

    /// Command for the gate binary with an environment isolated to this home.
    pub fn command(&self, bin: &str, subcommand: &str) -> Command {
        let mut cmd = Command::new(bin);
        cmd.arg(subcommand)
            .env("HOME", self.path())
            .env("CLAUDE_ENV_FILE", self.env_file())
            .env_remove("CLAUDE_QC_OVERRIDE")
            .env_remove("CLAUDE_MAIN_OVERRIDE")
            .env_remove("QUALITY_CYCLE_MODE")
            .env_remove("RUST_LOG")
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE");
        cmd
    }
}

/// Exit code and captured streams of one hook invocation.
#[derive(Debug)]
pub struct HookRun {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Spawn `cmd`, feed `input` on stdin and wait for it to finish.
pub fn run_hook(mut cmd: Command, input: &str) -> Result<HookRun> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn hook")?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).context("write stdin")?;
    }
    let output = child.wait_with_output().context("wait for hook")?;
    Ok(HookRun {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
