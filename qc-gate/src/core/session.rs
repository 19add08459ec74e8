//! Session-start classification.
//!
//! Decides whether a fresh session is the user's main thread (tear down any
//! stale context), a workflow session (activate a context), or neither.

use std::path::{Path, PathBuf};

use crate::core::rules::{is_ticket_session, is_valid_session_id, is_worktree_dir, subagent_type};

/// Workflow category recorded as the context's agent type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCategory {
    /// Session id names a known workflow agent.
    Agent(String),
    Worktree,
    Ticket,
    /// `QUALITY_CYCLE_MODE=true` was set.
    Explicit,
}

impl SessionCategory {
    pub fn as_str(&self) -> &str {
        match self {
            SessionCategory::Agent(token) => token,
            SessionCategory::Worktree => "worktree",
            SessionCategory::Ticket => "ticket",
            SessionCategory::Explicit => "explicit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionClass {
    MainThread,
    Workflow(SessionCategory),
    Unrecognized,
}

/// Inputs that are not part of the request itself.
#[derive(Debug, Clone, Default)]
pub struct SessionEnv {
    pub home: Option<PathBuf>,
    pub explicit_mode: bool,
}

/// Directories that identify the user's own interactive session.
pub fn main_thread_dirs(home: &Path) -> [PathBuf; 3] {
    [home.to_path_buf(), home.join("docs"), home.join(".claude")]
}

/// Classify a starting session. Checks run in a fixed order; the first hit wins.
pub fn classify_session(session_id: &str, cwd: &Path, env: &SessionEnv) -> SessionClass {
    let agent = subagent_type(session_id);

    if let Some(home) = env.home.as_deref()
        && agent.is_none()
        && main_thread_dirs(home).iter().any(|dir| dir.as_path() == cwd)
    {
        return SessionClass::MainThread;
    }

    // Every workflow category requires a well-formed id; it ends up in the store.
    if !is_valid_session_id(session_id) {
        return SessionClass::Unrecognized;
    }
    if let Some(token) = agent {
        return SessionClass::Workflow(SessionCategory::Agent(token.to_string()));
    }
    if is_worktree_dir(&cwd.to_string_lossy()) {
        return SessionClass::Workflow(SessionCategory::Worktree);
    }
    if is_ticket_session(session_id) {
        return SessionClass::Workflow(SessionCategory::Ticket);
    }
    if env.explicit_mode {
        return SessionClass::Workflow(SessionCategory::Explicit);
    }
    SessionClass::Unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> SessionEnv {
        SessionEnv {
            home: Some(PathBuf::from("/home/dev")),
            explicit_mode: false,
        }
    }

    #[test]
    fn home_dirs_are_main_thread() {
        for cwd in ["/home/dev", "/home/dev/docs", "/home/dev/.claude", "/home/dev/"] {
            assert_eq!(
                classify_session("abc123", Path::new(cwd), &env()),
                SessionClass::MainThread,
                "{cwd}"
            );
        }
    }

    #[test]
    fn subagent_in_home_is_not_main_thread() {
        assert_eq!(
            classify_session("code-reviewer-9", Path::new("/home/dev"), &env()),
            SessionClass::Workflow(SessionCategory::Agent("code-reviewer".to_string()))
        );
    }

    #[test]
    fn nested_home_dir_is_not_main_thread() {
        assert_eq!(
            classify_session("abc123", Path::new("/home/dev/projects/x"), &env()),
            SessionClass::Unrecognized
        );
    }

    #[test]
    fn worktree_beats_ticket() {
        let cwd = Path::new("/home/dev/workspace/worktrees/repo/feat");
        assert_eq!(
            classify_session("TICKET-abc-1", cwd, &env()),
            SessionClass::Workflow(SessionCategory::Worktree)
        );
    }

    #[test]
    fn ticket_session_ids() {
        assert_eq!(
            classify_session("TICKET-abc-1", Path::new("/srv/repo"), &env()),
            SessionClass::Workflow(SessionCategory::Ticket)
        );
    }

    #[test]
    fn explicit_mode_is_last_resort() {
        let env = SessionEnv {
            explicit_mode: true,
            ..env()
        };
        assert_eq!(
            classify_session("abc123", Path::new("/srv/repo"), &env),
            SessionClass::Workflow(SessionCategory::Explicit)
        );
        // Main thread still wins over explicit mode.
        assert_eq!(
            classify_session("abc123", Path::new("/home/dev"), &env),
            SessionClass::MainThread
        );
    }

    #[test]
    fn malformed_session_id_never_activates() {
        let env = SessionEnv {
            explicit_mode: true,
            ..env()
        };
        let cwd = Path::new("/home/dev/workspace/worktrees/repo/feat");
        assert_eq!(
            classify_session("bad id\nQUALITY_CYCLE_ACTIVE=true", cwd, &env),
            SessionClass::Unrecognized
        );
    }

    #[test]
    fn missing_home_skips_main_thread_check() {
        let env = SessionEnv {
            home: None,
            explicit_mode: false,
        };
        assert_eq!(
            classify_session("abc123", Path::new("/home/dev"), &env),
            SessionClass::Unrecognized
        );
    }
}
