//! Agent tools backed by a [`RepositoryHost`]
//!
//! Every tool returns plain text for the model. Failures never escape as
//! errors of the agent loop: they become `Error <action>: ...` observations
//! the model can reason about.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use sidekick_core::tool::parse_args;
use sidekick_core::{Tool, ToolError, ToolResult, ToolSet};
use tracing::{info, warn};

use crate::host::{NewPullRequest, RepositoryHost, WriteOutcome};
use crate::{Error, RepoRef};

/// Build the full GitHub tool set over one host
pub fn github_tools(host: Arc<dyn RepositoryHost>) -> ToolSet {
    ToolSet::new()
        .with(Arc::new(ListRepositories { host: host.clone() }))
        .with(Arc::new(ListFiles { host: host.clone() }))
        .with(Arc::new(ReadFile { host: host.clone() }))
        .with(Arc::new(WriteFile { host: host.clone() }))
        .with(Arc::new(DeleteFile { host: host.clone() }))
        .with(Arc::new(CreateBranch { host: host.clone() }))
        .with(Arc::new(CreatePullRequest { host: host.clone() }))
        .with(Arc::new(GetIssue { host }))
}

/// Repository names, or a single `Error listing repositories: ...` entry
pub async fn list_repositories_fail_open(host: &dyn RepositoryHost) -> Vec<String> {
    match host.list_repositories().await {
        Ok(repos) => repos,
        Err(e) => {
            warn!(error = %e, "Failed to list repositories");
            vec![failure(LIST_REPOS, e).to_string()]
        }
    }
}

/// The error text when a fail-open listing failed
pub fn listing_failure(repos: &[String]) -> Option<&str> {
    match repos {
        [only] if only.starts_with(LISTING_FAILURE_PREFIX) => Some(only),
        _ => None,
    }
}

const LISTING_FAILURE_PREFIX: &str = "Error listing repositories: ";

const LIST_REPOS: &str = "listing repositories";
const LIST_FILES: &str = "listing files";
const READ_FILE: &str = "reading file";
const WRITE_FILE: &str = "creating or updating file";
const DELETE_FILE: &str = "deleting file";
const CREATE_BRANCH: &str = "creating branch";
const CREATE_PR: &str = "creating pull request";
const GET_ISSUE: &str = "getting issue details";

fn failure(action: &'static str, err: Error) -> ToolError {
    match err {
        Error::Auth(message) => ToolError::Unauthenticated { action, message },
        other => ToolError::remote(action, other),
    }
}

fn repo(action: &'static str, name: &str) -> Result<RepoRef, ToolError> {
    name.parse().map_err(|e| failure(action, e))
}

fn optional_branch(branch: &Option<String>) -> Option<&str> {
    branch.as_deref().map(str::trim).filter(|b| !b.is_empty())
}

/// Models sometimes send numbers as strings
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .trim_start_matches('#')
            .parse()
            .map_err(serde::de::Error::custom),
    }
}

fn repo_schema() -> Value {
    json!({
        "type": "string",
        "description": "Full repository name in owner/repo form"
    })
}

fn branch_schema() -> Value {
    json!({
        "type": "string",
        "description": "Branch to use instead of the repository's default branch"
    })
}

#[derive(Deserialize)]
struct RepoArgs {
    repo_name: String,
}

#[derive(Deserialize)]
struct ReadArgs {
    repo_name: String,
    file_path: String,
    #[serde(default)]
    branch: Option<String>,
}

#[derive(Deserialize)]
struct WriteArgs {
    repo_name: String,
    file_path: String,
    content: String,
    commit_message: String,
    #[serde(default)]
    branch: Option<String>,
}

#[derive(Deserialize)]
struct DeleteArgs {
    repo_name: String,
    file_path: String,
    commit_message: String,
    #[serde(default)]
    branch: Option<String>,
}

#[derive(Deserialize)]
struct BranchArgs {
    repo_name: String,
    branch_name: String,
}

#[derive(Deserialize)]
struct PullRequestArgs {
    repo_name: String,
    title: String,
    #[serde(default)]
    body: String,
    head_branch: String,
}

#[derive(Deserialize)]
struct IssueArgs {
    repo_name: String,
    #[serde(deserialize_with = "number_or_string")]
    issue_number: u64,
}

struct ListRepositories {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for ListRepositories {
    fn name(&self) -> &'static str {
        "list_my_repositories"
    }

    fn description(&self) -> &'static str {
        "Lists all repositories the authenticated user has access to."
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _args: Value) -> ToolResult {
        info!("Listing all accessible repositories");
        let repos = self
            .host
            .list_repositories()
            .await
            .map_err(|e| failure(LIST_REPOS, e))?;
        Ok(repos.join("\n"))
    }
}

struct ListFiles {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for ListFiles {
    fn name(&self) -> &'static str {
        "list_repository_files"
    }

    fn description(&self) -> &'static str {
        "Lists all files in a repository recursively, one path per line."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "repo_name": repo_schema() },
            "required": ["repo_name"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: RepoArgs = parse_args(self.name(), args)?;
        let repo = repo(LIST_FILES, &args.repo_name)?;
        info!(repo = %repo, "Listing files");

        let files = self
            .host
            .list_files(&repo)
            .await
            .map_err(|e| failure(LIST_FILES, e))?;
        Ok(files.join("\n"))
    }
}

struct ReadFile {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Reads the content of a file in the repository."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "file_path": { "type": "string", "description": "Path of the file to read" },
                "branch": branch_schema()
            },
            "required": ["repo_name", "file_path"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: ReadArgs = parse_args(self.name(), args)?;
        let repo = repo(READ_FILE, &args.repo_name)?;
        info!(repo = %repo, path = %args.file_path, "Reading file");

        self.host
            .read_file(&repo, &args.file_path, optional_branch(&args.branch))
            .await
            .map_err(|e| failure(READ_FILE, e))
    }
}

struct WriteFile {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &'static str {
        "create_or_update_file"
    }

    fn description(&self) -> &'static str {
        "Creates a new file or updates an existing one in the repository."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "file_path": { "type": "string", "description": "Path of the file to write" },
                "content": { "type": "string", "description": "Complete new file content" },
                "commit_message": { "type": "string" },
                "branch": branch_schema()
            },
            "required": ["repo_name", "file_path", "content", "commit_message"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: WriteArgs = parse_args(self.name(), args)?;
        let repo = repo(WRITE_FILE, &args.repo_name)?;
        info!(repo = %repo, path = %args.file_path, "Writing file");

        let outcome = self
            .host
            .write_file(
                &repo,
                &args.file_path,
                &args.content,
                &args.commit_message,
                optional_branch(&args.branch),
            )
            .await
            .map_err(|e| failure(WRITE_FILE, e))?;

        Ok(match outcome {
            WriteOutcome::Created => format!("Successfully created file '{}'.", args.file_path),
            WriteOutcome::Updated => format!("Successfully updated file '{}'.", args.file_path),
        })
    }
}

struct DeleteFile {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &'static str {
        "delete_file"
    }

    fn description(&self) -> &'static str {
        "Deletes a file from the repository."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "file_path": { "type": "string", "description": "Path of the file to delete" },
                "commit_message": { "type": "string" },
                "branch": branch_schema()
            },
            "required": ["repo_name", "file_path", "commit_message"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: DeleteArgs = parse_args(self.name(), args)?;
        let repo = repo(DELETE_FILE, &args.repo_name)?;
        info!(repo = %repo, path = %args.file_path, "Deleting file");

        self.host
            .delete_file(
                &repo,
                &args.file_path,
                &args.commit_message,
                optional_branch(&args.branch),
            )
            .await
            .map_err(|e| failure(DELETE_FILE, e))?;

        Ok(format!("Successfully deleted file '{}'.", args.file_path))
    }
}

struct CreateBranch {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for CreateBranch {
    fn name(&self) -> &'static str {
        "create_branch"
    }

    fn description(&self) -> &'static str {
        "Creates a new branch from the default branch of the repo."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "branch_name": { "type": "string", "description": "Name of the new branch" }
            },
            "required": ["repo_name", "branch_name"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: BranchArgs = parse_args(self.name(), args)?;
        let repo = repo(CREATE_BRANCH, &args.repo_name)?;
        info!(repo = %repo, branch = %args.branch_name, "Creating branch");

        self.host
            .create_branch(&repo, &args.branch_name)
            .await
            .map_err(|e| failure(CREATE_BRANCH, e))?;

        Ok(format!("Successfully created branch '{}'.", args.branch_name))
    }
}

struct CreatePullRequest {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for CreatePullRequest {
    fn name(&self) -> &'static str {
        "create_pull_request"
    }

    fn description(&self) -> &'static str {
        "Creates a pull request from a branch into the repository's default branch."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "title": { "type": "string" },
                "body": { "type": "string" },
                "head_branch": { "type": "string", "description": "Branch containing the changes" }
            },
            "required": ["repo_name", "title", "body", "head_branch"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: PullRequestArgs = parse_args(self.name(), args)?;
        let repo = repo(CREATE_PR, &args.repo_name)?;
        info!(repo = %repo, head = %args.head_branch, "Creating pull request");

        let request = NewPullRequest {
            title: args.title,
            body: args.body,
            head_branch: args.head_branch,
        };
        let pr = self
            .host
            .create_pull_request(&repo, &request)
            .await
            .map_err(|e| failure(CREATE_PR, e))?;

        Ok(format!(
            "Successfully created Pull Request #{}: {}",
            pr.number, pr.url
        ))
    }
}

struct GetIssue {
    host: Arc<dyn RepositoryHost>,
}

#[async_trait]
impl Tool for GetIssue {
    fn name(&self) -> &'static str {
        "get_issue_details"
    }

    fn description(&self) -> &'static str {
        "Fetches the title and body of a specific GitHub issue."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo_name": repo_schema(),
                "issue_number": { "type": "integer", "minimum": 1 }
            },
            "required": ["repo_name", "issue_number"]
        })
    }

    async fn invoke(&self, args: Value) -> ToolResult {
        let args: IssueArgs = parse_args(self.name(), args)?;
        let repo = repo(GET_ISSUE, &args.repo_name)?;
        info!(repo = %repo, number = args.issue_number, "Getting issue");

        let issue = self
            .host
            .get_issue(&repo, args.issue_number)
            .await
            .map_err(|e| failure(GET_ISSUE, e))?;

        Ok(format!(
            "Issue Title: {}\nIssue Body: {}",
            issue.title, issue.body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Numbered {
        #[serde(deserialize_with = "number_or_string")]
        n: u64,
    }

    #[test]
    fn test_number_or_string() {
        let a: Numbered = serde_json::from_value(json!({"n": 42})).unwrap();
        let b: Numbered = serde_json::from_value(json!({"n": "#42"})).unwrap();
        assert_eq!(a.n, 42);
        assert_eq!(b.n, 42);
        assert!(serde_json::from_value::<Numbered>(json!({"n": "forty"})).is_err());
    }

    #[test]
    fn test_failure_mapping() {
        let err = failure(READ_FILE, Error::NotFound("File 'a.rs'".to_string()));
        assert_eq!(err.to_string(), "Error reading file: File 'a.rs' not found");

        let err = failure(LIST_REPOS, Error::Auth("Invalid GitHub token".to_string()));
        assert!(matches!(err, ToolError::Unauthenticated { .. }));
        assert_eq!(
            err.to_string(),
            "Error listing repositories: Invalid GitHub token"
        );
    }

    #[test]
    fn test_listing_failure_detection() {
        let failed = vec!["Error listing repositories: Invalid GitHub token".to_string()];
        assert_eq!(
            listing_failure(&failed),
            Some("Error listing repositories: Invalid GitHub token")
        );

        let owner_named_error = vec!["ErrorCorp/widgets".to_string()];
        assert_eq!(listing_failure(&owner_named_error), None);

        let two = vec![failed[0].clone(), "acme/widgets".to_string()];
        assert_eq!(listing_failure(&two), None);
        assert_eq!(listing_failure(&[]), None);
    }

    #[test]
    fn test_invalid_repo_name() {
        let err = repo(LIST_FILES, "widgets").unwrap_err();
        assert!(err.to_string().starts_with("Error listing files: Invalid repository"));
    }

    #[test]
    fn test_optional_branch() {
        assert_eq!(optional_branch(&Some("  ".to_string())), None);
        assert_eq!(optional_branch(&Some("fix/issue-1".to_string())), Some("fix/issue-1"));
        assert_eq!(optional_branch(&None), None);
    }
}
