//! Declarative string classifiers.
//!
//! Each classifier is an ordered table of `(category, predicate)` rows; the
//! first matching row wins. Tables are data so they can be audited and tested
//! row by row without touching the decision flow.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Known workflow agents. A session id `<token>-<suffix>` belongs to a sub-agent.
pub const SUBAGENT_TOKENS: &[&str] = &[
    "code-developer",
    "code-reviewer",
    "code-tester",
    "tech-writer",
    "tech-editor",
    "tech-publisher",
    "prompt-engineer",
    "prompt-reviewer",
    "prompt-tester",
    "plugin-engineer",
    "plugin-reviewer",
    "plugin-tester",
];

static SESSION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

static SUBAGENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = SUBAGENT_TOKENS.join("|");
    Regex::new(&format!(r"^({alternatives})-[A-Za-z0-9_-]+$")).unwrap()
});

static TICKET_SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TICKET-[A-Za-z0-9]+-[0-9]+$").unwrap());

static WORKTREE_CWD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/workspace/worktrees/[^/]+/[^/]+").unwrap());

/// True if the session id only uses `[A-Za-z0-9_-]`.
pub fn is_valid_session_id(session_id: &str) -> bool {
    SESSION_ID_RE.is_match(session_id)
}

/// Return the agent token when `session_id` follows the sub-agent naming convention.
pub fn subagent_type(session_id: &str) -> Option<&str> {
    if !is_valid_session_id(session_id) {
        return None;
    }
    SUBAGENT_RE
        .captures(session_id)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_ticket_session(session_id: &str) -> bool {
    TICKET_SESSION_RE.is_match(session_id)
}

pub fn is_worktree_dir(cwd: &str) -> bool {
    WORKTREE_CWD_RE.is_match(cwd)
}

/// Why a path counts as a protected artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCategory {
    AgentDefinition,
    Skill,
    ShellScript,
    InterpreterScript,
    Hook,
    SourceCode,
    Documentation,
}

impl PathCategory {
    pub fn describe(self) -> &'static str {
        match self {
            PathCategory::AgentDefinition => "agent definition",
            PathCategory::Skill => "skill definition",
            PathCategory::ShellScript => "shell script",
            PathCategory::InterpreterScript => "interpreter script",
            PathCategory::Hook => "hook script",
            PathCategory::SourceCode => "source code",
            PathCategory::Documentation => "documentation",
        }
    }
}

struct PathRule {
    category: PathCategory,
    matches: fn(&str) -> bool,
}

static AGENT_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.claude/agents/.*/AGENT\.md$").unwrap());
static INTERPRETER_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(bash|ksh|zsh|fish|py|rb|pl)$").unwrap());
static CODE_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(go|ts|tsx|js|jsx|rs|java|c|cpp|h|hpp)$").unwrap());
static DOC_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(md|mdx|rst|adoc)$").unwrap());
static HANDOFF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"handoff-.*\.md$").unwrap());

const PATH_RULES: &[PathRule] = &[
    PathRule {
        category: PathCategory::AgentDefinition,
        matches: |p| AGENT_DEF_RE.is_match(p),
    },
    PathRule {
        category: PathCategory::Skill,
        matches: |p| p.contains(".claude/skills/"),
    },
    PathRule {
        category: PathCategory::ShellScript,
        matches: |p| p.ends_with(".sh") || p.contains("/scripts/"),
    },
    PathRule {
        category: PathCategory::InterpreterScript,
        matches: |p| INTERPRETER_EXT_RE.is_match(p),
    },
    PathRule {
        category: PathCategory::Hook,
        matches: |p| p.contains(".claude/hooks/"),
    },
    PathRule {
        category: PathCategory::SourceCode,
        matches: |p| CODE_EXT_RE.is_match(p),
    },
    PathRule {
        category: PathCategory::Documentation,
        matches: |p| DOC_EXT_RE.is_match(p) && !is_transient_doc(p),
    },
];

/// Ticket content and handoff notes are working artifacts, not maintained documentation.
fn is_transient_doc(path: &str) -> bool {
    path.contains("/tickets/") || HANDOFF_RE.is_match(path)
}

/// Classify a (possibly not yet existing) path. `None` means unprotected.
pub fn classify_path(path: &str) -> Option<PathCategory> {
    PATH_RULES
        .iter()
        .find(|rule| (rule.matches)(path))
        .map(|rule| rule.category)
}

/// Why a command counts as a script operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    ShellFile,
    ScriptsDir,
    HooksDir,
    Sourced,
    Interpreter,
    MakeExecutable,
}

impl ScriptKind {
    pub fn describe(self) -> &'static str {
        match self {
            ScriptKind::ShellFile => "shell script execution",
            ScriptKind::ScriptsDir => "scripts directory",
            ScriptKind::HooksDir => "hooks directory",
            ScriptKind::Sourced => "sourced shell script",
            ScriptKind::Interpreter => "interpreter invocation",
            ScriptKind::MakeExecutable => "chmod +x",
        }
    }
}

struct CommandRule {
    kind: ScriptKind,
    matches: fn(&str) -> bool,
}

static SH_FILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.sh(\s|$|;|&|\|)").unwrap());
static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(source|\.)\s+[^/]*\.sh").unwrap());
static INTERPRETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(bash|sh|zsh|ksh|python|python3|ruby|perl)\s+").unwrap()
});

const COMMAND_RULES: &[CommandRule] = &[
    CommandRule {
        kind: ScriptKind::ShellFile,
        matches: |c| SH_FILE_RE.is_match(c),
    },
    CommandRule {
        kind: ScriptKind::ScriptsDir,
        matches: |c| c.contains("/scripts/"),
    },
    CommandRule {
        kind: ScriptKind::HooksDir,
        matches: |c| c.contains("/hooks/"),
    },
    CommandRule {
        kind: ScriptKind::Sourced,
        matches: |c| SOURCE_RE.is_match(c),
    },
    CommandRule {
        kind: ScriptKind::Interpreter,
        matches: |c| INTERPRETER_RE.is_match(c),
    },
    CommandRule {
        kind: ScriptKind::MakeExecutable,
        matches: |c| c.contains("chmod") && c.contains("+x"),
    },
];

/// Classify a shell command line. `None` means it is not a script operation.
pub fn classify_command(command: &str) -> Option<ScriptKind> {
    COMMAND_RULES
        .iter()
        .find(|rule| (rule.matches)(command))
        .map(|rule| rule.kind)
}
