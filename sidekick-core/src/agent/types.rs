//! Task kinds offered to users
//!
//! Each kind maps to a prompt template:
//! - Feature: implement a new feature on a branch and open a PR
//! - Debug: fix a GitHub issue on a branch and open a PR
//! - FileWrite / FileRead / FileDelete: single-file operations

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of task the agent is asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Implement a new feature
    #[default]
    Feature,
    /// Debug and fix an issue
    Debug,
    /// Create or update a file
    FileWrite,
    /// Read a file's content
    FileRead,
    /// Delete a file
    FileDelete,
}

impl TaskKind {
    /// Get all task kinds
    pub fn all() -> &'static [TaskKind] {
        &[
            TaskKind::Feature,
            TaskKind::Debug,
            TaskKind::FileWrite,
            TaskKind::FileRead,
            TaskKind::FileDelete,
        ]
    }

    /// Get the short name for this task kind
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Feature => "feature",
            TaskKind::Debug => "debug",
            TaskKind::FileWrite => "file_write",
            TaskKind::FileRead => "file_read",
            TaskKind::FileDelete => "file_delete",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Feature => "Implement New Feature",
            TaskKind::Debug => "Debug and Fix an Issue",
            TaskKind::FileWrite => "Create or Update a File",
            TaskKind::FileRead => "Read a File's Content",
            TaskKind::FileDelete => "Delete a File",
        }
    }

    /// Whether the prompt embeds the branch → edit → pull request procedure
    pub fn is_procedural(&self) -> bool {
        matches!(self, TaskKind::Feature | TaskKind::Debug)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "feature" | "feat" => Ok(TaskKind::Feature),
            "debug" | "fix" => Ok(TaskKind::Debug),
            "file_write" | "write" => Ok(TaskKind::FileWrite),
            "file_read" | "read" => Ok(TaskKind::FileRead),
            "file_delete" | "delete" => Ok(TaskKind::FileDelete),
            _ => Err(format!("Unknown task kind: {}", s)),
        }
    }
}

/// A task selection together with its kind-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskRequest {
    Feature {
        description: String,
    },
    Debug {
        issue_number: u64,
        #[serde(default)]
        guidance: Option<String>,
    },
    FileWrite {
        path: String,
        content: String,
        /// Defaults to `feat: Create or update <path>`
        #[serde(default)]
        commit_message: Option<String>,
    },
    FileRead {
        path: String,
    },
    FileDelete {
        path: String,
        /// Defaults to `refactor: Delete <path>`
        #[serde(default)]
        commit_message: Option<String>,
    },
}

impl TaskRequest {
    /// The kind of this request
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::Feature { .. } => TaskKind::Feature,
            TaskRequest::Debug { .. } => TaskKind::Debug,
            TaskRequest::FileWrite { .. } => TaskKind::FileWrite,
            TaskRequest::FileRead { .. } => TaskKind::FileRead,
            TaskRequest::FileDelete { .. } => TaskKind::FileDelete,
        }
    }
}
