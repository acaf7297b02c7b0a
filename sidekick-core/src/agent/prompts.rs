//! Task prompt templates
//!
//! This module turns a task selection into the goal string handed to the
//! agent. Templates are embedded markdown files using `{{VARIABLE}}`
//! placeholders. The feature and debug templates spell out an ordered
//! procedure (branch, explore, edit, pull request, report) that the model
//! is asked to follow; [`super::ProcedureGuard`] can enforce it.

use std::collections::HashMap;

use super::{TaskKind, TaskRequest};
use crate::{Error, Result};

const FEATURE_PROMPT: &str = include_str!("prompts/feature.md");
const DEBUG_PROMPT: &str = include_str!("prompts/debug.md");
const FILE_WRITE_PROMPT: &str = include_str!("prompts/file_write.md");
const FILE_READ_PROMPT: &str = include_str!("prompts/file_read.md");
const FILE_DELETE_PROMPT: &str = include_str!("prompts/file_delete.md");

/// Get the raw prompt template for a task kind
pub fn get_template(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Feature => FEATURE_PROMPT,
        TaskKind::Debug => DEBUG_PROMPT,
        TaskKind::FileWrite => FILE_WRITE_PROMPT,
        TaskKind::FileRead => FILE_READ_PROMPT,
        TaskKind::FileDelete => FILE_DELETE_PROMPT,
    }
}

/// Context for rendering a prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Variable substitutions
    variables: HashMap<String, String>,
}

impl PromptContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set a variable value (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the repository full name
    pub fn with_repo(self, repo: impl Into<String>) -> Self {
        self.with("REPO", repo)
    }

    /// Set the file path
    pub fn with_path(self, path: impl Into<String>) -> Self {
        self.with("PATH", path)
    }
}

/// Render the template for a task kind with the given context
pub fn render(kind: TaskKind, context: &PromptContext) -> String {
    render_template(get_template(kind).trim(), context)
}

/// Render a template string with variable substitution
///
/// Placeholders are resolved in a single pass, so substituted values are
/// never scanned again. Unset uppercase placeholders become
/// "(not specified)"; anything else between braces is kept verbatim.
/// Substituted values are inserted exactly as given.
fn render_template(template: &str, context: &PromptContext) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            result.push_str(&rest[start..]);
            return result;
        };

        let name = &after[..end];
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
            match context.variables.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str("(not specified)"),
            }
        } else {
            result.push_str(&rest[start..start + 2 + end + 2]);
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Build the goal string for a task against a repository
pub fn build_goal(repo: &str, request: &TaskRequest) -> Result<String> {
    let repo = repo.trim();
    if repo.is_empty() {
        return Err(Error::InvalidTask(
            "Please select a repository first.".to_string(),
        ));
    }

    let context = PromptContext::new().with_repo(repo);

    let context = match request {
        TaskRequest::Feature { description } => {
            let description = required("feature description", description)?;
            context.with("FEATURE_DESCRIPTION", description)
        }
        TaskRequest::Debug {
            issue_number,
            guidance,
        } => {
            if *issue_number == 0 {
                return Err(Error::InvalidTask(
                    "issue number must be at least 1".to_string(),
                ));
            }
            let guidance = guidance
                .as_deref()
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .unwrap_or("None provided.");
            context
                .with("ISSUE_NUMBER", issue_number.to_string())
                .with("GUIDANCE", guidance)
        }
        TaskRequest::FileWrite {
            path,
            content,
            commit_message,
        } => {
            let path = required("file path", path)?;
            if content.is_empty() {
                return Err(Error::InvalidTask("file content is required".to_string()));
            }
            let message = commit_message_or(commit_message, || {
                format!("feat: Create or update {}", path)
            });
            context
                .with_path(path)
                .with("CONTENT", content.as_str())
                .with("COMMIT_MESSAGE", message)
        }
        TaskRequest::FileRead { path } => context.with_path(required("file path", path)?),
        TaskRequest::FileDelete {
            path,
            commit_message,
        } => {
            let path = required("file path", path)?;
            let message = commit_message_or(commit_message, || format!("refactor: Delete {}", path));
            context.with_path(path).with("COMMIT_MESSAGE", message)
        }
    };

    Ok(render(request.kind(), &context))
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::InvalidTask(format!("{} is required", field)))
    } else {
        Ok(value)
    }
}

fn commit_message_or(message: &Option<String>, default: impl FnOnce() -> String) -> String {
    message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(default)
}
