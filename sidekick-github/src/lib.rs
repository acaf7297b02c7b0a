//! Sidekick GitHub - GitHub integration for Code Sidekick
//!
//! This crate provides the repository host the agent acts on: listing
//! repositories and files, reading and committing files, creating branches
//! and pull requests, and reading issues. The host is exposed to the
//! language model as a set of tools bound to one user's credential.

mod client;
mod contents;
mod error;
mod host;
mod issues;
mod pulls;
mod repo;
mod tools;

pub use client::GitHubClient;
pub use error::{Error, Result};
pub use host::{IssueDetails, NewPullRequest, PullRequestInfo, RepositoryHost, WriteOutcome};
pub use repo::RepoRef;
pub use tools::{github_tools, list_repositories_fail_open, listing_failure};
