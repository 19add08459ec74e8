//! Orchestration for one PreToolUse check.
//!
//! Decodes the request, wires the real collaborators into the decision engine,
//! records audit events and maps the verdict to an exit code. Every failure on
//! the way resolves to allow.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::branch::BranchClassifier;
use crate::core::engine::{Evaluation, Reason, evaluate};
use crate::core::types::Outcome;
use crate::exit_codes;
use crate::io::audit::AuditLog;
use crate::io::context_store::{ContextStore, StoreError};
use crate::io::env::GateEnv;
use crate::io::request::decode_request;

/// Decode and evaluate `input`. `None` means the request was unusable.
pub fn check<B: BranchClassifier>(
    input: &[u8],
    env: &GateEnv,
    branches: &B,
    fallback_cwd: &Path,
) -> Option<Evaluation> {
    let request = match decode_request(input, fallback_cwd) {
        Ok(request) => request,
        Err(err) => {
            warn!(err = %format!("{err:#}"), "failed to decode request, allowing");
            return None;
        }
    };
    debug!(tool = %request.tool_name, session = %request.session_id, "hook invoked");

    let store = open_store(env);
    let eval = evaluate(&request, branches, &store, env.overrides());
    log_evaluation(&eval);
    Some(eval)
}

/// Run the full check and return the process exit code.
///
/// Block and warn text goes to `stderr`; audit events are recorded first.
pub fn enforce<B: BranchClassifier, W: Write>(
    input: &[u8],
    env: &GateEnv,
    branches: &B,
    audit: &AuditLog,
    fallback_cwd: &Path,
    stderr: &mut W,
) -> i32 {
    let Some(eval) = check(input, env, branches, fallback_cwd) else {
        return exit_codes::ALLOW;
    };
    for event in &eval.audit {
        audit.record(event);
    }
    if let Some(message) = &eval.verdict.message
        && let Err(err) = write_message(stderr, message)
    {
        warn!(err = %err, "failed to write verdict message");
    }
    match eval.verdict.outcome {
        Outcome::Block => exit_codes::BLOCK,
        Outcome::Allow | Outcome::Warn => exit_codes::ALLOW,
    }
}

/// Resolve the context store, logging why it is unavailable.
pub fn open_store(env: &GateEnv) -> Option<ContextStore> {
    match ContextStore::from_env(env) {
        Ok(store) => Some(store),
        Err(StoreError::Unset) => {
            debug!("no context store configured");
            None
        }
        Err(err) => {
            warn!(err = %err, "context store rejected");
            None
        }
    }
}

fn write_message<W: Write>(out: &mut W, message: &str) -> Result<()> {
    out.write_all(message.as_bytes())?;
    out.flush()?;
    Ok(())
}

fn log_evaluation(eval: &Evaluation) {
    let target = eval
        .target
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    match &eval.reason {
        Reason::OutOfScope => {}
        Reason::ProtectedBranch { branch } => {
            info!(branch = %branch, target = %target, "protected branch write blocked");
        }
        Reason::Authorized { authorization } => {
            info!(?authorization, "quality cycle active, allowing");
        }
        Reason::ScriptCommand { kind } => info!(?kind, "script operation blocked"),
        Reason::ProtectedPath { category } => {
            info!(?category, target = %target, "protected path modification blocked");
        }
        Reason::InvalidPath { error } => {
            warn!(?error, "invalid target path, allowing");
        }
        Reason::MissingTarget => debug!("no target path, allowing"),
        Reason::NoRuleMatched => debug!("no rule matched, allowing"),
    }
    if eval.verdict.outcome == Outcome::Warn {
        warn!(target = %target, "staging branch edit");
    }
}
