//! Scripted agent runs over the GitHub tools

mod common;

use std::sync::Arc;

use common::FakeHost;
use serde_json::json;
use sidekick_core::agent::TraceKind;
use sidekick_core::{
    build_goal, AgentExecutor, ProcedureGuard, ScriptedModel, TaskPhase, TaskRequest,
};
use sidekick_github::github_tools;

const REPO: &str = "acme/widgets";

#[tokio::test]
async fn test_read_task_end_to_end() {
    let host = Arc::new(FakeHost::new().with_file(REPO, "README.md", "Hello"));
    let goal = build_goal(
        REPO,
        &TaskRequest::FileRead {
            path: "README.md".to_string(),
        },
    )
    .unwrap();
    assert_eq!(
        goal,
        "In repository 'acme/widgets', read the content of the file at path 'README.md' and present it as your final answer."
    );

    let model = Arc::new(
        ScriptedModel::new()
            .then_call(
                "read_file",
                json!({"repo_name": REPO, "file_path": "README.md"}),
            )
            .then_answer("The README contains: Hello"),
    );
    let run = AgentExecutor::new(model.clone(), github_tools(host))
        .run(&goal)
        .await;

    assert!(run.completed);
    assert!(run.output.contains("Hello"));
    assert_eq!(run.trace.count_calls("read_file"), 1);
    assert_eq!(run.trace.tool_calls().len(), 1);

    // the model saw the goal and then the file content
    let transcript = &model.transcripts()[1];
    assert_eq!(transcript[1].content.as_deref(), Some(goal.as_str()));
    assert_eq!(transcript.last().unwrap().content.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn test_tool_failure_reaches_model() {
    let host = Arc::new(FakeHost::new().with_repo(REPO));
    let model = Arc::new(
        ScriptedModel::new()
            .then_call(
                "delete_file",
                json!({"repo_name": REPO, "file_path": "gone.txt", "commit_message": "refactor: Delete gone.txt"}),
            )
            .then_answer("The file does not exist."),
    );
    let run = AgentExecutor::new(model, github_tools(host))
        .run("delete gone.txt")
        .await;

    assert!(run.completed);
    let observation = run
        .trace
        .entries()
        .iter()
        .find(|e| e.kind == TraceKind::Observation)
        .unwrap();
    assert!(observation.content.starts_with("Error deleting file:"));
}

#[tokio::test]
async fn test_guarded_debug_task() {
    let host = Arc::new(
        FakeHost::new()
            .with_file(REPO, "src/lib.rs", "fn add(a: i32, b: i32) -> i32 { a - b }")
            .with_issue(REPO, 42, "add subtracts", "add(1, 1) returns 0"),
    );
    let goal = build_goal(
        REPO,
        &TaskRequest::Debug {
            issue_number: 42,
            guidance: None,
        },
    )
    .unwrap();

    let model = Arc::new(
        ScriptedModel::new()
            .then_call("get_issue_details", json!({"repo_name": REPO, "issue_number": 42}))
            .then_call("create_branch", json!({"repo_name": REPO, "branch_name": "fix/issue-42"}))
            .then_call("list_repository_files", json!({"repo_name": REPO}))
            .then_call(
                "read_file",
                json!({"repo_name": REPO, "file_path": "src/lib.rs", "branch": "fix/issue-42"}),
            )
            .then_call(
                "create_or_update_file",
                json!({
                    "repo_name": REPO,
                    "file_path": "src/lib.rs",
                    "content": "fn add(a: i32, b: i32) -> i32 { a + b }",
                    "commit_message": "fix: Resolve issue #42",
                    "branch": "fix/issue-42"
                }),
            )
            .then_call(
                "create_pull_request",
                json!({
                    "repo_name": REPO,
                    "title": "Fix: Resolve issue #42",
                    "body": "Use addition in add",
                    "head_branch": "fix/issue-42"
                }),
            )
            .then_answer("Opened Pull Request #1: https://github.com/acme/widgets/pull/1"),
    );

    let run = AgentExecutor::new(model, github_tools(host.clone()))
        .with_procedure_guard(true)
        .run(&goal)
        .await;

    assert!(run.completed, "{}", run.logs());
    assert_eq!(run.procedure, Some(TaskPhase::Reported));
    assert!(host.files(REPO, "main")["src/lib.rs"].contains("a - b"));
    assert!(host.files(REPO, "fix/issue-42")["src/lib.rs"].contains("a + b"));
    assert_eq!(host.pulls(REPO).len(), 1);
}

#[tokio::test]
async fn test_guard_blocks_edit_before_branch() {
    let host = Arc::new(FakeHost::new().with_file(REPO, "src/lib.rs", "old"));
    let model = Arc::new(
        ScriptedModel::new()
            .then_call(
                "create_or_update_file",
                json!({"repo_name": REPO, "file_path": "src/lib.rs", "content": "new", "commit_message": "feat: x"}),
            )
            .then_answer("stopped"),
    );

    let run = AgentExecutor::new(model, github_tools(host.clone()))
        .with_procedure_guard(true)
        .run("implement x")
        .await;

    assert_eq!(host.files(REPO, "main")["src/lib.rs"], "old");
    assert!(host.writes().is_empty());
    assert_eq!(run.procedure, Some(TaskPhase::Started));
}

#[tokio::test]
async fn test_guard_blocks_edit_on_default_branch() {
    let host = Arc::new(FakeHost::new().with_file(REPO, "src/lib.rs", "old"));
    let write = |branch: Option<&str>| {
        let mut args = json!({
            "repo_name": REPO,
            "file_path": "src/lib.rs",
            "content": "new",
            "commit_message": "feat: x"
        });
        if let Some(branch) = branch {
            args["branch"] = json!(branch);
        }
        args
    };
    let model = Arc::new(
        ScriptedModel::new()
            .then_call("create_branch", json!({"repo_name": REPO, "branch_name": "feat/x"}))
            .then_call("list_repository_files", json!({"repo_name": REPO}))
            .then_call("create_or_update_file", write(None))
            .then_call("create_or_update_file", write(Some("main")))
            .then_call("create_or_update_file", write(Some("feat/x")))
            .then_answer("stopped"),
    );

    let run = AgentExecutor::new(model, github_tools(host.clone()))
        .with_procedure_guard(true)
        .run("implement x")
        .await;

    let rejected = run
        .trace
        .entries()
        .iter()
        .filter(|e| e.kind == TraceKind::Observation && e.content.contains("was not run"))
        .count();
    assert_eq!(rejected, 2, "{}", run.logs());
    assert_eq!(host.files(REPO, "main")["src/lib.rs"], "old");
    assert_eq!(host.files(REPO, "feat/x")["src/lib.rs"], "new");
    assert_eq!(host.writes().len(), 1);
    assert_eq!(run.procedure, Some(TaskPhase::EditApplied));
}

#[test]
fn test_guard_refuses_exactly_the_state_changing_tools() {
    let tools = github_tools(Arc::new(FakeHost::new()));
    let guard = ProcedureGuard::new();

    let mut refused: Vec<&str> = tools
        .names()
        .into_iter()
        .filter(|name| !guard.check(name, &json!({})).is_valid())
        .collect();
    refused.sort_unstable();

    // create_branch is the allowed first step
    assert_eq!(
        refused,
        vec!["create_or_update_file", "create_pull_request", "delete_file"]
    );
}
