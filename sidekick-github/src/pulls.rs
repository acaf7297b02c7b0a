//! Branches and pull requests

use octocrab::models::repos::Object;
use octocrab::params::repos::Reference;
use tracing::{debug, info};

use crate::host::{NewPullRequest, PullRequestInfo};
use crate::{Error, GitHubClient, RepoRef, Result};

impl GitHubClient {
    /// Create `refs/heads/<branch>` at the tip of the default branch
    pub async fn create_branch(&self, repo: &RepoRef, branch: &str) -> Result<()> {
        let base = self.default_branch(repo).await?;
        let handler = self.client().repos(&repo.owner, &repo.name);

        let base_ref = handler
            .get_ref(&Reference::Branch(base.clone()))
            .await
            .map_err(|e| Error::not_found_or(e, || format!("Branch '{}'", base)))?;

        let sha = match base_ref.object {
            Object::Commit { sha, .. } | Object::Tag { sha, .. } => sha,
            #[allow(unreachable_patterns)]
            _ => {
                return Err(Error::Other(format!(
                    "Branch '{}' does not point at a commit",
                    base
                )))
            }
        };

        debug!(repo = %repo, branch, base = %base, sha = %sha, "Creating branch");
        handler
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await?;

        info!(repo = %repo, branch, "Created branch");
        Ok(())
    }

    /// Open a pull request from `head_branch` into the default branch
    pub async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequestInfo> {
        let base = self.default_branch(repo).await?;
        debug!(repo = %repo, head = %request.head_branch, base = %base, "Creating pull request");

        let pr = self
            .client()
            .pulls(&repo.owner, &repo.name)
            .create(&request.title, &request.head_branch, &base)
            .body(&request.body)
            .send()
            .await?;

        let url = pr
            .html_url
            .map(|u| u.to_string())
            .unwrap_or_else(|| format!("https://github.com/{}/pull/{}", repo, pr.number));

        info!(repo = %repo, number = pr.number, "Created pull request");
        Ok(PullRequestInfo {
            number: pr.number,
            url,
        })
    }
}
