//! In-memory repository host for tests

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use sidekick_github::{
    Error, IssueDetails, NewPullRequest, PullRequestInfo, RepoRef, RepositoryHost, Result,
    WriteOutcome,
};

const DEFAULT_BRANCH: &str = "main";

type Files = BTreeMap<String, String>;

#[derive(Default)]
struct FakeRepo {
    branches: BTreeMap<String, Files>,
    issues: HashMap<u64, IssueDetails>,
    pulls: Vec<(PullRequestInfo, String)>,
}

#[derive(Default)]
struct State {
    repos: BTreeMap<String, FakeRepo>,
    failing_listing: bool,
    failing_lookup: bool,
    writes: Vec<(String, WriteOutcome)>,
}

/// A [`RepositoryHost`] holding repositories in memory
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<State>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty repository with a `main` branch
    pub fn with_repo(self, repo: &str) -> Self {
        {
            let mut state = self.state.lock();
            let entry = state.repos.entry(repo.to_string()).or_default();
            entry.branches.entry(DEFAULT_BRANCH.to_string()).or_default();
        }
        self
    }

    /// Add a file to the default branch
    pub fn with_file(self, repo: &str, path: &str, content: &str) -> Self {
        let this = self.with_repo(repo);
        {
            let mut state = this.state.lock();
            if let Some(files) = state
                .repos
                .get_mut(repo)
                .and_then(|r| r.branches.get_mut(DEFAULT_BRANCH))
            {
                files.insert(path.to_string(), content.to_string());
            }
        }
        this
    }

    pub fn with_issue(self, repo: &str, number: u64, title: &str, body: &str) -> Self {
        let this = self.with_repo(repo);
        {
            let mut state = this.state.lock();
            if let Some(r) = state.repos.get_mut(repo) {
                r.issues.insert(
                    number,
                    IssueDetails {
                        number,
                        title: title.to_string(),
                        body: body.to_string(),
                    },
                );
            }
        }
        this
    }

    /// Make repository listing fail
    pub fn failing_listing(self) -> Self {
        self.state.lock().failing_listing = true;
        self
    }

    /// Make file lookups fail with a server error instead of "not found"
    pub fn failing_lookup(self) -> Self {
        self.state.lock().failing_lookup = true;
        self
    }

    /// Files on a branch
    pub fn files(&self, repo: &str, branch: &str) -> Files {
        self.state
            .lock()
            .repos
            .get(repo)
            .and_then(|r| r.branches.get(branch))
            .cloned()
            .unwrap_or_default()
    }

    pub fn branches(&self, repo: &str) -> Vec<String> {
        self.state
            .lock()
            .repos
            .get(repo)
            .map(|r| r.branches.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Pull requests opened, with their head branch
    pub fn pulls(&self, repo: &str) -> Vec<(PullRequestInfo, String)> {
        self.state
            .lock()
            .repos
            .get(repo)
            .map(|r| r.pulls.clone())
            .unwrap_or_default()
    }

    /// Every write with its path and outcome
    pub fn writes(&self) -> Vec<(String, WriteOutcome)> {
        self.state.lock().writes.clone()
    }
}

fn branch_name(branch: Option<&str>) -> String {
    branch.unwrap_or(DEFAULT_BRANCH).to_string()
}

fn with_files<T>(
    state: &mut State,
    repo: &RepoRef,
    branch: Option<&str>,
    f: impl FnOnce(&mut Files) -> Result<T>,
) -> Result<T> {
    let branch = branch_name(branch);
    let files = state
        .repos
        .get_mut(&repo.full_name())
        .ok_or_else(|| Error::NotFound(format!("Repository {}", repo)))?
        .branches
        .get_mut(&branch)
        .ok_or_else(|| Error::NotFound(format!("Branch '{}'", branch)))?;
    f(files)
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn list_repositories(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        if state.failing_listing {
            return Err(Error::Auth("Bad credentials".to_string()));
        }
        Ok(state.repos.keys().cloned().collect())
    }

    async fn list_files(&self, repo: &RepoRef) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        with_files(&mut state, repo, None, |files| Ok(files.keys().cloned().collect()))
    }

    async fn read_file(&self, repo: &RepoRef, path: &str, branch: Option<&str>) -> Result<String> {
        let mut state = self.state.lock();
        with_files(&mut state, repo, branch, |files| {
            files
                .get(path)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("File '{}'", path)))
        })
    }

    async fn write_file(
        &self,
        repo: &RepoRef,
        path: &str,
        content: &str,
        _message: &str,
        branch: Option<&str>,
    ) -> Result<WriteOutcome> {
        let mut state = self.state.lock();
        if state.failing_lookup {
            return Err(Error::Other("500 Server Error".to_string()));
        }
        let outcome = with_files(&mut state, repo, branch, |files| {
            let previous = files.insert(path.to_string(), content.to_string());
            Ok(match previous {
                Some(_) => WriteOutcome::Updated,
                None => WriteOutcome::Created,
            })
        })?;
        state.writes.push((path.to_string(), outcome));
        Ok(outcome)
    }

    async fn delete_file(
        &self,
        repo: &RepoRef,
        path: &str,
        _message: &str,
        branch: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        with_files(&mut state, repo, branch, |files| {
            files
                .remove(path)
                .map(|_| ())
                .ok_or_else(|| Error::NotFound(format!("File '{}'", path)))
        })
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str) -> Result<()> {
        let mut state = self.state.lock();
        let r = state
            .repos
            .get_mut(&repo.full_name())
            .ok_or_else(|| Error::NotFound(format!("Repository {}", repo)))?;
        if r.branches.contains_key(branch) {
            return Err(Error::Other("Reference already exists".to_string()));
        }
        let base = r.branches.get(DEFAULT_BRANCH).cloned().unwrap_or_default();
        r.branches.insert(branch.to_string(), base);
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequestInfo> {
        let mut state = self.state.lock();
        let r = state
            .repos
            .get_mut(&repo.full_name())
            .ok_or_else(|| Error::NotFound(format!("Repository {}", repo)))?;

        let head = r
            .branches
            .get(&request.head_branch)
            .ok_or_else(|| Error::Other("Validation Failed (field 'head' invalid)".to_string()))?;
        if Some(head) == r.branches.get(DEFAULT_BRANCH) {
            return Err(Error::Other(format!(
                "Validation Failed (No commits between {} and {})",
                DEFAULT_BRANCH, request.head_branch
            )));
        }

        let number = r.pulls.len() as u64 + 1;
        let info = PullRequestInfo {
            number,
            url: format!("https://github.com/{}/pull/{}", repo, number),
        };
        r.pulls.push((info.clone(), request.head_branch.clone()));
        Ok(info)
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<IssueDetails> {
        self.state
            .lock()
            .repos
            .get(&repo.full_name())
            .and_then(|r| r.issues.get(&number))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Issue #{}", number)))
    }
}
