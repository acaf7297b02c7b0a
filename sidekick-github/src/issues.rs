//! Issue fetching

use tracing::debug;

use crate::host::IssueDetails;
use crate::{Error, GitHubClient, RepoRef, Result};

impl GitHubClient {
    /// Fetch a single issue by number
    pub async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueDetails> {
        debug!(repo = %repo, number, "Fetching issue");

        let issue = self
            .client()
            .issues(&repo.owner, &repo.name)
            .get(number)
            .await
            .map_err(|e| Error::not_found_or(e, || format!("Issue #{}", number)))?;

        Ok(IssueDetails {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
        })
    }
}
