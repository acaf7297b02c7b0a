//! Repository references

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A repository identified by owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Full name in `owner/name` form
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    /// Supports formats:
    /// - owner/repo
    /// - https://github.com/owner/repo
    /// - git@github.com:owner/repo.git
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.starts_with("https://") || s.starts_with("http://") {
            let url = url::Url::parse(s).map_err(|e| Error::InvalidRepo(format!("{}: {}", s, e)))?;
            let path = url.path().trim_matches('/').trim_end_matches(".git");
            return split_pair(path).ok_or_else(|| invalid(s));
        }

        if let Some(rest) = s.strip_prefix("git@") {
            return rest
                .split_once(':')
                .and_then(|(_, path)| split_pair(path.trim_end_matches(".git")))
                .ok_or_else(|| invalid(s));
        }

        split_pair(s.trim_end_matches(".git"))
            .filter(|_| s.matches('/').count() == 1)
            .ok_or_else(|| invalid(s))
    }
}

fn split_pair(path: &str) -> Option<RepoRef> {
    let mut parts = path.split('/');
    let owner = parts.next()?.trim();
    let name = parts.next()?.trim();
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some(RepoRef::new(owner, name))
}

fn invalid(s: &str) -> Error {
    Error::InvalidRepo(format!("'{}'. Expected owner/repo", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shorthand() {
        let repo: RepoRef = "acme/widgets".parse().unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.name, "widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_parse_https_url() {
        let repo: RepoRef = "https://github.com/acme/widgets.git".parse().unwrap();
        assert_eq!(repo, RepoRef::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_ssh_url() {
        let repo: RepoRef = "git@github.com:acme/widgets.git".parse().unwrap();
        assert_eq!(repo, RepoRef::new("acme", "widgets"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("widgets".parse::<RepoRef>().is_err());
        assert!("acme/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
        assert!("".parse::<RepoRef>().is_err());
    }
}
