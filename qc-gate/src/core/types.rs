//! Shared deterministic types for the gate.
//!
//! These types form the contract between the decoder, the classifiers and the
//! decision engine. Nothing here touches the filesystem or the environment.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Tool kinds the gate knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Execute,
    EditFile,
    WriteFile,
    Other,
}

impl ToolKind {
    /// Map a host tool name onto a kind.
    pub fn from_tool_name(name: &str) -> Self {
        match name {
            "Bash" => ToolKind::Execute,
            "Edit" => ToolKind::EditFile,
            "Write" => ToolKind::WriteFile,
            _ => ToolKind::Other,
        }
    }

    pub fn is_file_write(self) -> bool {
        matches!(self, ToolKind::EditFile | ToolKind::WriteFile)
    }
}

/// Tool-specific parameters, typed per kind after decoding.
///
/// Missing or non-string parameters decode to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Execute { command: Option<String> },
    EditFile { file_path: Option<String> },
    WriteFile { file_path: Option<String> },
    Other,
}

impl ToolCall {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::Execute { .. } => ToolKind::Execute,
            ToolCall::EditFile { .. } => ToolKind::EditFile,
            ToolCall::WriteFile { .. } => ToolKind::WriteFile,
            ToolCall::Other => ToolKind::Other,
        }
    }

    /// Target path for file-writing tools.
    pub fn file_path(&self) -> Option<&str> {
        match self {
            ToolCall::EditFile { file_path } | ToolCall::WriteFile { file_path } => {
                file_path.as_deref().filter(|p| !p.is_empty())
            }
            _ => None,
        }
    }

    /// Command string for the execute tool.
    pub fn command(&self) -> Option<&str> {
        match self {
            ToolCall::Execute { command } => command.as_deref().filter(|c| !c.is_empty()),
            _ => None,
        }
    }
}

/// One decoded invocation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Tool name exactly as the host sent it (used in messages).
    pub tool_name: String,
    pub session_id: String,
    pub cwd: PathBuf,
    pub call: ToolCall,
}

impl InvocationRequest {
    pub fn kind(&self) -> ToolKind {
        self.call.kind()
    }
}

/// Branch protection class of the repository enclosing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchClass {
    Protected,
    WarnOnly,
    Unprotected,
    NotInRepo,
}

/// Classification plus the branch name it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchState {
    pub class: BranchClass,
    /// `None` when the path is not inside a working tree.
    pub name: Option<String>,
}

impl BranchState {
    pub fn not_in_repo() -> Self {
        Self {
            class: BranchClass::NotInRepo,
            name: None,
        }
    }
}

/// Persisted "this session is an authorized workflow" record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityCycleContext {
    pub active: bool,
    pub agent_type: Option<String>,
    pub session_id: Option<String>,
    /// Kept as written; the store never interprets it.
    pub started: Option<String>,
}

impl QualityCycleContext {
    pub fn inactive() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Allow,
    Block,
    Warn,
}

/// Final decision for one request. `Block` and `Warn` always carry text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub message: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            outcome: Outcome::Allow,
            message: None,
        }
    }

    pub fn block(message: String) -> Self {
        Self {
            outcome: Outcome::Block,
            message: Some(message),
        }
    }

    pub fn warn(message: String) -> Self {
        Self {
            outcome: Outcome::Warn,
            message: Some(message),
        }
    }

    pub fn is_block(&self) -> bool {
        self.outcome == Outcome::Block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// `CLAUDE_QC_OVERRIDE` bypassed the quality-cycle gate.
    QcOverride,
    /// `CLAUDE_MAIN_OVERRIDE` bypassed the branch gate.
    MainOverride,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditKind::QcOverride => "QC_OVERRIDE",
            AuditKind::MainOverride => "MAIN_OVERRIDE",
        }
    }
}

/// Append-only audit record. Never read back by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub session_id: String,
    pub detail: String,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, session_id: &str, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            session_id: session_id.to_string(),
            detail: detail.into(),
        }
    }

    /// One-line human rendering used on stderr and in the debug log.
    pub fn render(&self) -> String {
        let mut line = format!(
            "[{}] {} used - session: {}",
            self.timestamp.to_rfc3339(),
            self.kind.as_str(),
            self.session_id
        );
        if !self.detail.is_empty() {
            line.push_str(", ");
            line.push_str(&self.detail);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_map_to_kinds() {
        assert_eq!(ToolKind::from_tool_name("Bash"), ToolKind::Execute);
        assert_eq!(ToolKind::from_tool_name("Edit"), ToolKind::EditFile);
        assert_eq!(ToolKind::from_tool_name("Write"), ToolKind::WriteFile);
        assert_eq!(ToolKind::from_tool_name("Read"), ToolKind::Other);
        assert_eq!(ToolKind::from_tool_name("bash"), ToolKind::Other);
    }

    #[test]
    fn empty_parameters_read_as_missing() {
        let call = ToolCall::EditFile {
            file_path: Some(String::new()),
        };
        assert_eq!(call.file_path(), None);
        let call = ToolCall::Execute {
            command: Some(String::new()),
        };
        assert_eq!(call.command(), None);
    }

    #[test]
    fn audit_render_includes_kind_and_session() {
        let event = AuditEvent::new(AuditKind::MainOverride, "sess-1", "file_branch: main");
        let line = event.render();
        assert!(line.contains("MAIN_OVERRIDE used - session: sess-1"));
        assert!(line.ends_with("file_branch: main"));
    }
}
