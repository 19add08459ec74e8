//! User-facing remediation text for blocked and warned operations.

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Command previews are cut to this many characters.
pub const COMMAND_PREVIEW_CHARS: usize = 100;

/// Shorten a command for display. Cosmetic only.
pub fn preview(command: &str) -> String {
    if command.chars().count() <= COMMAND_PREVIEW_CHARS {
        return command.to_string();
    }
    let mut out: String = command.chars().take(COMMAND_PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

fn banner(title: &str, body: &str) -> String {
    format!("{RULE}\n{title}\n{RULE}\n\n{body}\n{RULE}\n")
}

/// `category` names the rule that matched, e.g. "source code".
pub fn quality_cycle_required(reason: &str, category: &str, tool: &str, target: &str) -> String {
    let body = format!(
        "Reason: {reason}
Category: {category}
Tool: {tool}
Target: {target}

Changes to code, scripts, specs and agent definitions must come from a
ticket-driven workflow agent.

TO PROCEED:
1. Write a ticket under tickets/queue/TICKET-<session-id>-<seq>.md
2. Hand it to the matching workflow agent:
   - code changes: code-developer
   - documentation: tech-writer
3. Let the review cycle finish (author, critic, publisher)

EMERGENCY OVERRIDE (audited):
  export CLAUDE_QC_OVERRIDE=true
"
    );
    banner("❌ QUALITY CYCLE REQUIRED - Operation Blocked", &body)
}

pub fn protected_branch(tool: &str, branch: &str, target: &str) -> String {
    let body = format!(
        "Branch: {branch}
Tool: {tool}
Target: {target}

Direct edits on protected branches skip review and CI.

TO PROCEED:
1. Create a worktree on a feature branch:
   git worktree add ../feature-name -b feature/your-feature
2. Work from there:
   cd ../feature-name
3. Open a pull request when done

WORKTREE COMMANDS:
  git worktree list
  git worktree add <path> -b <branch>
  git worktree remove <path>

EMERGENCY OVERRIDE (audited):
  export CLAUDE_MAIN_OVERRIDE=true
This only lifts branch protection; the quality cycle still applies.
"
    );
    banner("❌ PROTECTED BRANCH - Operation Blocked", &body)
}

pub fn staging_warning(tool: &str, target: &str) -> String {
    let body = format!(
        "Tool: {tool}
Target: {target}

You are editing directly on staging. Prefer a feature branch:
  git checkout -b feature/your-feature staging

Proceeding with operation...
"
    );
    banner("⚠️  STAGING BRANCH - Proceeding with Warning", &body)
}

/// Printed by `session-start` after a context is persisted.
pub fn activation_banner(agent_type: &str, session_id: &str, cwd: &str) -> String {
    let body = format!(
        "Agent Type: {agent_type}
Session ID: {session_id}
Working Directory: {cwd}

Quality cycle operations are now permitted in this session.
"
    );
    banner("✅ Quality Cycle Context Activated", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_commands_are_unchanged() {
        assert_eq!(preview("ls"), "ls");
        let exact = "x".repeat(COMMAND_PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);
    }

    #[test]
    fn long_commands_are_truncated_with_ellipsis() {
        let long = "y".repeat(250);
        let out = preview(&long);
        assert_eq!(out.len(), COMMAND_PREVIEW_CHARS + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(150);
        let out = preview(&long);
        assert_eq!(out.chars().count(), COMMAND_PREVIEW_CHARS + 3);
    }

    #[test]
    fn quality_message_names_category_and_target() {
        let msg = quality_cycle_required(
            "Protected file modification requires quality cycle",
            "source code",
            "Edit",
            "/repo/src/lib.rs",
        );
        assert!(msg.contains("Category: source code"));
        assert!(msg.contains("Target: /repo/src/lib.rs"));
        assert!(msg.contains("CLAUDE_QC_OVERRIDE"));
    }

    #[test]
    fn branch_message_names_branch_and_override() {
        let msg = protected_branch("Edit", "main", "/repo/src/lib.rs");
        assert!(msg.contains("Branch: main"));
        assert!(msg.contains("CLAUDE_MAIN_OVERRIDE"));
        assert!(msg.contains("git worktree add"));
    }
}
