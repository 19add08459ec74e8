//! Branch gate tests against real scratch repositories.

use qc_gate::exit_codes;
use qc_gate::test_support::{HookRun, TestHome, TestRepo, edit_request, run_hook};

const BIN: &str = env!("CARGO_BIN_EXE_qc-gate");

fn enforce(home: &TestHome, input: &str, overrides: &[&str]) -> HookRun {
    let mut cmd = home.command(BIN, "enforce");
    for var in overrides {
        cmd.env(var, "true");
    }
    run_hook(cmd, input).expect("run enforce")
}

#[test]
fn protected_branch_blocks_even_workflow_agents() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("main").expect("repo");
    let target = repo.path().join("src").join("main.rs");

    let run = enforce(
        &home,
        &edit_request("code-developer-abc", repo.path(), &target),
        &[],
    );
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("PROTECTED BRANCH"), "{}", run.stderr);
    assert!(run.stderr.contains("main"), "{}", run.stderr);
}

#[test]
fn release_branches_are_protected() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("release/1.2").expect("repo");
    let target = repo.path().join("notes.txt");

    let run = enforce(&home, &edit_request("code-developer-abc", repo.path(), &target), &[]);
    assert_eq!(run.code, Some(exit_codes::BLOCK));
}

#[test]
fn main_override_audits_then_applies_quality_gate() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("main").expect("repo");
    let target = repo.path().join("src").join("main.rs");

    let run = enforce(
        &home,
        &edit_request("sess1", repo.path(), &target),
        &["CLAUDE_MAIN_OVERRIDE"],
    );
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("MAIN_OVERRIDE used"), "{}", run.stderr);
    assert!(run.stderr.contains("QUALITY CYCLE REQUIRED"), "{}", run.stderr);

    let run = enforce(
        &home,
        &edit_request("code-developer-abc", repo.path(), &target),
        &["CLAUDE_MAIN_OVERRIDE"],
    );
    assert_eq!(run.code, Some(exit_codes::ALLOW));
    assert!(home.audit_log().exists());
}

#[test]
fn staging_branch_warns_but_allows() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("staging").expect("repo");
    let target = repo.path().join("data.json");

    let run = enforce(&home, &edit_request("sess1", repo.path(), &target), &[]);
    assert_eq!(run.code, Some(exit_codes::ALLOW));
    assert!(run.stderr.contains("STAGING BRANCH"), "{}", run.stderr);
}

#[test]
fn staging_warning_accompanies_a_quality_block() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("staging").expect("repo");
    let target = repo.path().join("src").join("main.rs");

    let run = enforce(&home, &edit_request("sess1", repo.path(), &target), &[]);
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("STAGING BRANCH"), "{}", run.stderr);
    assert!(run.stderr.contains("QUALITY CYCLE REQUIRED"), "{}", run.stderr);
}

#[test]
fn null_session_id_on_protected_branch_is_blocked() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("main").expect("repo");
    let target = repo.path().join("src").join("main.rs");
    let input = serde_json::json!({
        "tool_name": "Edit",
        "session_id": null,
        "cwd": null,
        "tool_input": { "file_path": target },
    })
    .to_string();

    let run = enforce(&home, &input, &[]);
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("PROTECTED BRANCH"), "{}", run.stderr);
}

#[test]
fn feature_branch_defers_to_quality_gate() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("main").expect("repo");
    repo.checkout_new("feature/login").expect("checkout");
    let target = repo.path().join("src").join("main.rs");

    let run = enforce(&home, &edit_request("code-tester-1", repo.path(), &target), &[]);
    assert_eq!(run.code, Some(exit_codes::ALLOW));
    assert!(run.stderr.is_empty(), "{}", run.stderr);

    let run = enforce(&home, &edit_request("sess1", repo.path(), &target), &[]);
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("QUALITY CYCLE REQUIRED"), "{}", run.stderr);
}

#[test]
fn branch_follows_the_target_not_the_session_cwd() {
    let home = TestHome::new().expect("home");
    let repo = TestRepo::on_branch("main").expect("repo");
    let elsewhere = tempfile::tempdir().expect("elsewhere");
    let target = repo.path().join("README.txt");

    let mut cmd = home.command(BIN, "enforce");
    cmd.current_dir(elsewhere.path());
    let run = run_hook(cmd, &edit_request("code-developer-abc", elsewhere.path(), &target))
        .expect("run");
    assert_eq!(run.code, Some(exit_codes::BLOCK));
    assert!(run.stderr.contains("PROTECTED BRANCH"), "{}", run.stderr);
}
