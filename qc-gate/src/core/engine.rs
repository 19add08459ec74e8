//! Policy decision engine.
//!
//! Evaluates one request against branch protection and the quality-cycle
//! policy. The order of the gates is part of the contract:
//!
//! 1. scope filter (only execute/edit/write are evaluated)
//! 2. hard branch gate for file writes
//! 3. quality-cycle authorization (override, active context, sub-agent id)
//! 4. script-command / protected-path gate
//! 5. allow
//!
//! The engine performs no I/O of its own; branch state and the persisted
//! context come in through [`BranchClassifier`] and [`ContextSource`].

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::core::branch::BranchClassifier;
use crate::core::remediation;
use crate::core::rules::{PathCategory, ScriptKind, classify_command, classify_path, subagent_type};
use crate::core::types::{
    AuditEvent, AuditKind, BranchClass, BranchState, InvocationRequest, QualityCycleContext,
    ToolKind, Verdict,
};

/// Read access to the persisted quality-cycle context.
///
/// Implementations resolve store failures to an inactive context.
pub trait ContextSource {
    fn load(&self) -> QualityCycleContext;
}

/// Environment escape hatches. Each use is audited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Bypass the quality-cycle gate.
    pub quality_cycle: bool,
    /// Bypass the protected-branch gate (the quality-cycle gate still applies).
    pub branch: bool,
}

/// Why the session counts as an authorized workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "via", content = "detail")]
pub enum Authorization {
    Override,
    ActiveContext { agent_type: Option<String> },
    Subagent(String),
}

/// Target path rejected before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathError {
    ControlCharacters,
    Unresolvable,
}

/// The rule that produced the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum Reason {
    OutOfScope,
    ProtectedBranch { branch: String },
    Authorized { authorization: Authorization },
    ScriptCommand { kind: ScriptKind },
    ProtectedPath { category: PathCategory },
    InvalidPath { error: PathError },
    MissingTarget,
    NoRuleMatched,
}

/// Verdict plus everything the caller needs to log and audit.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub reason: Reason,
    /// Branch state of the target, when the branch gate ran.
    pub branch: Option<BranchState>,
    /// Absolute target path, for file-writing tools with a valid path.
    pub target: Option<PathBuf>,
    pub audit: Vec<AuditEvent>,
}

/// Evaluate one request.
pub fn evaluate<B: BranchClassifier, C: ContextSource>(
    request: &InvocationRequest,
    branches: &B,
    context: &C,
    overrides: Overrides,
) -> Evaluation {
    let mut eval = Evaluation {
        verdict: Verdict::allow(),
        reason: Reason::OutOfScope,
        branch: None,
        target: None,
        audit: Vec::new(),
    };

    let kind = request.kind();
    if kind == ToolKind::Other {
        return eval;
    }

    let raw_target = request.call.file_path();
    let target = raw_target.map(|raw| resolve_target(raw, &request.cwd));
    if let Some(Ok(path)) = &target {
        eval.target = Some(path.clone());
    }

    let mut warning = None;
    if kind.is_file_write()
        && let Some(raw) = raw_target
    {
        // An unusable path cannot be located in a repository.
        let state = match &target {
            Some(Ok(path)) => branches.classify(path),
            _ => BranchState::not_in_repo(),
        };
        let branch_name = state.name.clone().unwrap_or_default();
        match state.class {
            BranchClass::Protected if !overrides.branch => {
                eval.verdict = Verdict::block(remediation::protected_branch(
                    &request.tool_name,
                    &branch_name,
                    raw,
                ));
                eval.reason = Reason::ProtectedBranch {
                    branch: branch_name,
                };
                eval.branch = Some(state);
                return eval;
            }
            BranchClass::Protected => {
                eval.audit.push(AuditEvent::new(
                    AuditKind::MainOverride,
                    &request.session_id,
                    format!(
                        "tool: {}, file_branch: {}, file: {}, cwd: {}",
                        request.tool_name,
                        branch_name,
                        raw,
                        request.cwd.display()
                    ),
                ));
            }
            BranchClass::WarnOnly => {
                warning = Some(remediation::staging_warning(&request.tool_name, raw));
            }
            BranchClass::Unprotected | BranchClass::NotInRepo => {}
        }
        eval.branch = Some(state);
    }

    if let Some(authorization) = authorize(request, context, overrides, &mut eval.audit) {
        eval.reason = Reason::Authorized { authorization };
        return finish(eval, warning);
    }

    match kind {
        ToolKind::Execute => {
            if let Some(command) = request.call.command()
                && let Some(script) = classify_command(command)
            {
                eval.verdict = Verdict::block(remediation::quality_cycle_required(
                    "Bash script creation/modification requires quality cycle",
                    script.describe(),
                    &request.tool_name,
                    &remediation::preview(command),
                ));
                eval.reason = Reason::ScriptCommand { kind: script };
                return finish(eval, warning);
            }
            eval.reason = Reason::NoRuleMatched;
        }
        ToolKind::EditFile | ToolKind::WriteFile => match target {
            None => eval.reason = Reason::MissingTarget,
            Some(Err(error)) => eval.reason = Reason::InvalidPath { error },
            Some(Ok(path)) => {
                let display = path.to_string_lossy();
                if let Some(category) = classify_path(&display) {
                    eval.verdict = Verdict::block(remediation::quality_cycle_required(
                        "Protected file modification requires quality cycle",
                        category.describe(),
                        &request.tool_name,
                        &display,
                    ));
                    eval.reason = Reason::ProtectedPath { category };
                    return finish(eval, warning);
                }
                eval.reason = Reason::NoRuleMatched;
            }
        },
        ToolKind::Other => {}
    }

    finish(eval, warning)
}

/// Step 3: override flag, then persisted context, then the session-id convention.
fn authorize<C: ContextSource>(
    request: &InvocationRequest,
    context: &C,
    overrides: Overrides,
    audit: &mut Vec<AuditEvent>,
) -> Option<Authorization> {
    if overrides.quality_cycle {
        audit.push(AuditEvent::new(
            AuditKind::QcOverride,
            &request.session_id,
            "",
        ));
        return Some(Authorization::Override);
    }
    let ctx = context.load();
    if ctx.active {
        return Some(Authorization::ActiveContext {
            agent_type: ctx.agent_type,
        });
    }
    subagent_type(&request.session_id).map(|token| Authorization::Subagent(token.to_string()))
}

/// Attach a pending staging warning: an allow becomes a warn, and a block
/// keeps its outcome with the warning printed ahead of the block text.
fn finish(mut eval: Evaluation, warning: Option<String>) -> Evaluation {
    let Some(warning) = warning else {
        return eval;
    };
    eval.verdict = match eval.verdict.message.take() {
        Some(block) if eval.verdict.is_block() => Verdict::block(format!("{warning}\n{block}")),
        _ => Verdict::warn(warning),
    };
    eval
}

/// Validate a raw target path and make it absolute against `cwd`.
pub fn resolve_target(raw: &str, cwd: &Path) -> Result<PathBuf, PathError> {
    if raw.chars().any(char::is_control) {
        return Err(PathError::ControlCharacters);
    }
    let path = Path::new(raw);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else if cwd.is_absolute() {
        cwd.join(path)
    } else {
        return Err(PathError::Unresolvable);
    };
    Ok(normalize_lexically(&joined))
}

/// Drop `.` and fold `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
