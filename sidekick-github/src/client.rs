//! GitHub API client using octocrab

use async_trait::async_trait;
use octocrab::Octocrab;
use sidekick_core::config::GitHubConfig;
use sidekick_core::Secrets;
use tracing::{debug, info};

use crate::host::{IssueDetails, NewPullRequest, PullRequestInfo, RepositoryHost, WriteOutcome};
use crate::{Error, RepoRef, Result};

/// GitHub API client acting on behalf of one user
pub struct GitHubClient {
    client: Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal or OAuth access token
    ///
    /// `api_url` overrides the REST API root (GitHub Enterprise).
    pub fn with_token(token: &str, api_url: Option<&str>) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Auth("GitHub token is empty".to_string()));
        }

        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| Error::Auth(format!("Invalid GitHub API URL '{}': {}", url, e)))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        debug!(api_url = ?api_url, "Created GitHub client");

        Ok(Self { client })
    }

    /// Create a client from the locally configured token
    ///
    /// Token is loaded from (in priority order):
    /// 1. GITHUB_PAT / GITHUB_TOKEN environment variables
    /// 2. ~/.config/sidekick/secrets.toml
    pub fn from_secrets(secrets: &Secrets, config: &GitHubConfig) -> Result<Self> {
        let token = secrets.github_token().ok_or_else(|| {
            Error::Auth(
                "GitHub token not found. Set GITHUB_PAT environment variable \
                 or add token to ~/.config/sidekick/secrets.toml"
                    .to_string(),
            )
        })?;

        Self::with_token(&token, config.api_url.as_deref())
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    /// Full names of every repository the token can access
    pub async fn list_repositories(&self) -> Result<Vec<String>> {
        debug!("Listing repositories for authenticated user");

        let first = self
            .client
            .current()
            .list_repos_for_authenticated_user()
            .per_page(100)
            .send()
            .await
            .map_err(|e| Error::not_found_or(e, || "Authenticated user".to_string()))?;

        let repos = self.client.all_pages(first).await?;
        let names: Vec<String> = repos.into_iter().filter_map(|r| r.full_name).collect();

        info!(count = names.len(), "Fetched repositories");
        Ok(names)
    }

    /// Name of the repository's default branch
    pub(crate) async fn default_branch(&self, repo: &RepoRef) -> Result<String> {
        let info = self
            .client
            .repos(&repo.owner, &repo.name)
            .get()
            .await
            .map_err(|e| Error::not_found_or(e, || format!("Repository {}", repo)))?;

        Ok(info.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    /// The given branch, or the default branch when none is given
    pub(crate) async fn resolve_branch(&self, repo: &RepoRef, branch: Option<&str>) -> Result<String> {
        match branch.map(str::trim).filter(|b| !b.is_empty()) {
            Some(branch) => Ok(branch.to_string()),
            None => self.default_branch(repo).await,
        }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient").finish_non_exhaustive()
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<String>> {
        GitHubClient::list_repositories(self).await
    }

    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
        GitHubClient::list_files(self, repo).await
    }

    async fn read_file(&self, repo: &RepoRef, path: &str, branch: Option<&str>) -> Result<String> {
        GitHubClient::read_file(self, repo, path, branch).await
    }

    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<WriteOutcome> {
        GitHubClient::write_file(self, repo, path, content, message, branch).await
    }

    async fn delete_file(
        &self,
        repo: &RepoRef,
        path: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<()> {
        GitHubClient::delete_file(self, repo, path, message, branch).await
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str) -> Result<()> {
        GitHubClient::create_branch(self, repo, branch).await
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequestInfo> {
        GitHubClient::create_pull_request(self, repo, request).await
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueDetails> {
        GitHubClient::get_issue(self, repo, number).await
    }
}
