//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("{}", api_message(.0))]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository, file, branch or issue does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Repository name could not be parsed
    #[error("Invalid repository: {0}")]
    InvalidRepo(String),

    /// Content could not be decoded as text
    #[error("{0}")]
    Decode(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the remote reported that the target does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api(octocrab::Error::GitHub { source, .. }) => is_not_found(source),
            _ => false,
        }
    }

    /// Map a GitHub "Not Found" response to [`Error::NotFound`] for `what`
    pub(crate) fn not_found_or(err: octocrab::Error, what: impl FnOnce() -> String) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } if is_not_found(source) => {
                Error::NotFound(what())
            }
            octocrab::Error::GitHub { source, .. }
                if source.message.contains("Bad credentials") =>
            {
                Error::Auth("Invalid GitHub token".to_string())
            }
            _ => Error::Api(err),
        }
    }
}

fn is_not_found(source: &octocrab::GitHubError) -> bool {
    source.status_code.as_u16() == 404 || source.message.contains("Not Found")
}

/// Short message for an API failure, without the captured backtrace
fn api_message(err: &octocrab::Error) -> String {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let details: Vec<String> = source
                .errors
                .iter()
                .flatten()
                .filter_map(|e| {
                    e.get("message")
                        .and_then(|m| m.as_str())
                        .or_else(|| e.as_str())
                        .map(str::to_string)
                })
                .collect();
            if details.is_empty() {
                format!("GitHub API error: {}", source.message)
            } else {
                format!("GitHub API error: {} ({})", source.message, details.join("; "))
            }
        }
        other => format!("GitHub API error: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(Error::NotFound("file 'a'".to_string()).is_not_found());
        assert!(!Error::Other("boom".to_string()).is_not_found());
        assert!(!Error::Auth("bad".to_string()).is_not_found());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::NotFound("Issue #7".to_string()).to_string(),
            "Issue #7 not found"
        );
        assert_eq!(
            Error::InvalidRepo("widgets".to_string()).to_string(),
            "Invalid repository: widgets"
        );
    }
}
