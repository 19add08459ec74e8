//! Hook entry points for the quality-cycle gate.
//!
//! `enforce` runs before every tool call and exits 0 (allow) or 2 (block).
//! `session-start` runs once per session and always exits 0.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info_span, warn};

use qc_gate::enforce::{check, enforce, open_store};
use qc_gate::exit_codes;
use qc_gate::io::audit::AuditLog;
use qc_gate::io::config::{GateConfig, load_or_default};
use qc_gate::io::env::GateEnv;
use qc_gate::io::git::GitBranchClassifier;
use qc_gate::logging;
use qc_gate::session_start::{SessionStartOutcome, session_start};

#[derive(Parser)]
#[command(
    name = "qc-gate",
    version,
    about = "Branch protection and quality-cycle gate for agent tool calls"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// PreToolUse hook: read a request on stdin, exit 0 to allow or 2 to block.
    Enforce,
    /// SessionStart hook: record or clear the quality-cycle context.
    SessionStart,
    /// Show the context store location and its current state.
    Status,
    /// Evaluate a request from stdin and print the decision as JSON.
    Explain,
}

struct Runtime {
    env: GateEnv,
    config: GateConfig,
    cwd: PathBuf,
}

impl Runtime {
    fn load() -> Self {
        let env = GateEnv::from_process();
        let claude_dir = env.claude_dir();
        let config = load_or_default(claude_dir.as_deref());
        logging::init(config.debug_log_path(claude_dir.as_deref()).as_deref());
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self { env, config, cwd }
    }

    fn branches(&self) -> GitBranchClassifier {
        GitBranchClassifier::new(self.config.git_timeout())
    }
}

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return ExitCode::from(code as u8),
    };
    let runtime = Runtime::load();
    let code = match cli.command {
        Command::Enforce => cmd_enforce(&runtime),
        Command::SessionStart => cmd_session_start(&runtime),
        Command::Status => report(cmd_status(&runtime)),
        Command::Explain => report(cmd_explain(&runtime)),
    };
    ExitCode::from(code as u8)
}

/// Parse arguments without letting clap pick the exit status: its usage
/// error code (2) would read as a block to the hook caller.
fn parse_args<I, T>(args: I) -> Result<Cli, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        let _ = err.print();
        exit_codes::ALLOW
    })
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err:#}");
            1
        }
    }
}

fn read_stdin() -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(err) = io::stdin().read_to_end(&mut buf) {
        warn!(err = %err, "failed to read stdin");
        buf.clear();
    }
    buf
}

fn cmd_enforce(rt: &Runtime) -> i32 {
    let _span = info_span!("enforce").entered();
    let input = read_stdin();
    let audit = AuditLog::new(rt.config.audit_log_path(rt.env.claude_dir().as_deref()));
    let mut stderr = io::stderr();
    enforce(&input, &rt.env, &rt.branches(), &audit, &rt.cwd, &mut stderr)
}

fn cmd_session_start(rt: &Runtime) -> i32 {
    let _span = info_span!("session_start").entered();
    let input = read_stdin();
    if let SessionStartOutcome::Activated { banner, .. } = session_start(&input, &rt.env, &rt.cwd)
    {
        print!("{banner}");
    }
    exit_codes::ALLOW
}

fn cmd_status(rt: &Runtime) -> Result<()> {
    let Some(store) = open_store(&rt.env) else {
        match &rt.env.env_file {
            Some(path) => println!(
                "context store: {} (rejected: not an allowed location)",
                path.display()
            ),
            None => println!("context store: not configured (CLAUDE_ENV_FILE unset)"),
        }
        return Ok(());
    };
    let ctx = store.get().context("read context store")?;
    println!("context store: {}", store.path().display());
    if !ctx.active {
        println!("quality cycle: inactive");
        return Ok(());
    }
    println!("quality cycle: active");
    println!("agent: {}", ctx.agent_type.as_deref().unwrap_or("-"));
    println!("session: {}", ctx.session_id.as_deref().unwrap_or("-"));
    println!("started: {}", ctx.started.as_deref().unwrap_or("-"));
    Ok(())
}

fn cmd_explain(rt: &Runtime) -> Result<()> {
    let input = read_stdin();
    match check(&input, &rt.env, &rt.branches(), &rt.cwd) {
        Some(eval) => {
            let json = serde_json::to_string_pretty(&eval).context("serialize evaluation")?;
            println!("{json}");
        }
        None => println!("request could not be decoded; the gate allows it"),
    }
    Ok(())
}
