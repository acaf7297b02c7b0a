//! Repository host contract
//!
//! Everything the agent can do to a repository goes through
//! [`RepositoryHost`]. [`crate::GitHubClient`] implements it against the
//! GitHub REST API; tests substitute an in-memory host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{RepoRef, Result};

/// Which branch of the create-or-update decision a write took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// A pull request to open into the repository's default branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head_branch: String,
}

/// A created pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub url: String,
}

/// Title and body of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    pub number: u64,
    pub title: String,
    pub body: String,
}

/// Source-control operations available to the agent, scoped to one
/// credential
///
/// File operations default to the repository's default branch when
/// `branch` is `None`.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Full names of every repository the credential can access
    async fn list_repositories(&self) -> Result<Vec<String>>;

    /// Paths of every file in the default branch, recursively
    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<String>>;

    /// Decoded text of a file
    async fn read_file(&self, repo: &RepoRef, path: &str, branch: Option<&str>) -> Result<String>;

    /// Create the file if it does not exist, otherwise replace its content
    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<WriteOutcome>;

    /// Delete an existing file
    async fn delete_file(
        &self,
        repo: &RepoRef,
        path: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<()>;

    /// Create a branch at the tip of the default branch
    async fn create_branch(&self, repo: &RepoRef, branch: &str) -> Result<()>;

    /// Open a pull request into the default branch
    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequestInfo>;

    /// Fetch an issue's title and body
    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueDetails>;
}
