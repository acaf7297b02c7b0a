//! File listing, reading and committing

use octocrab::models::repos::Content;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::host::WriteOutcome;
use crate::{Error, GitHubClient, RepoRef, Result};

/// Git tree as returned by `GET /repos/{owner}/{repo}/git/trees/{sha}`
#[derive(Debug, Deserialize)]
struct GitTree {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Paths of the blob entries of a tree, in tree order
fn blob_paths(tree: GitTree) -> Vec<String> {
    tree.tree
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .map(|entry| entry.path)
        .collect()
}

impl GitHubClient {
    /// Paths of every file in the default branch
    pub async fn list_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let branch = self.default_branch(repo).await?;
        debug!(repo = %repo, branch = %branch, "Fetching recursive tree");

        let route = format!("/repos/{}/{}/git/trees/{}", repo.owner, repo.name, branch);
        let tree: GitTree = self
            .client()
            .get(route, Some(&[("recursive", "1")]))
            .await
            .map_err(|e| Error::not_found_or(e, || format!("Branch '{}' of {}", branch, repo)))?;

        if tree.truncated {
            warn!(repo = %repo, "Tree listing truncated by GitHub");
        }

        let files = blob_paths(tree);
        info!(repo = %repo, count = files.len(), "Listed files");
        Ok(files)
    }

    /// Decoded text of a file
    pub async fn read_file(&self, repo: &RepoRef, path: &str, branch: Option<&str>) -> Result<String> {
        let branch = self.resolve_branch(repo, branch).await?;
        let file = self.fetch_file(repo, path, &branch).await?;

        file.decoded_content().ok_or_else(|| {
            Error::Decode(format!(
                "File '{}' has no text content (binary or too large)",
                path
            ))
        })
    }

    /// Create or update a file
    ///
    /// Only a definite "Not Found" from the lookup routes to creation; any
    /// other lookup failure is returned.
    pub async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<WriteOutcome> {
        let branch = self.resolve_branch(repo, branch).await?;

        let existing_sha = match self.fetch_file(repo, path, &branch).await {
            Ok(file) => Some(file.sha),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        let handler = self.client().repos(&repo.owner, &repo.name);
        let outcome = match existing_sha {
            Some(sha) => {
                handler
                    .update_file(path, message, content, sha)
                    .branch(&branch)
                    .send()
                    .await?;
                WriteOutcome::Updated
            }
            None => {
                handler
                    .create_file(path, message, content)
                    .branch(&branch)
                    .send()
                    .await?;
                WriteOutcome::Created
            }
        };

        info!(repo = %repo, path, branch = %branch, ?outcome, "Committed file");
        Ok(outcome)
    }

    /// Delete an existing file
    pub async fn delete_file(
        &self,
        repo: &RepoRef,
        path: &str,
        message: &str,
        branch: Option<&str>,
    ) -> Result<()> {
        let branch = self.resolve_branch(repo, branch).await?;
        let file = self.fetch_file(repo, path, &branch).await?;

        self.client()
            .repos(&repo.owner, &repo.name)
            .delete_file(path, message, file.sha)
            .branch(&branch)
            .send()
            .await?;

        info!(repo = %repo, path, branch = %branch, "Deleted file");
        Ok(())
    }

    /// Metadata and content of a single file
    async fn fetch_file(&self, repo: &RepoRef, path: &str, branch: &str) -> Result<Content> {
        debug!(repo = %repo, path, branch, "Fetching file contents");

        let mut items = self
            .client()
            .repos(&repo.owner, &repo.name)
            .get_content()
            .path(path)
            .r#ref(branch)
            .send()
            .await
            .map_err(|e| Error::not_found_or(e, || format!("File '{}'", path)))?
            .items;

        // a directory path yields its entries, even when it holds a single file
        match (items.pop(), items.is_empty()) {
            (Some(file), true) if is_requested_file(&file, path) => Ok(file),
            _ => Err(Error::Decode(format!("'{}' is a directory, not a file", path))),
        }
    }
}

fn is_requested_file(item: &Content, path: &str) -> bool {
    item.r#type == "file" && item.path.trim_matches('/') == path.trim_matches('/')
}
