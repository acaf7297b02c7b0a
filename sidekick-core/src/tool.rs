//! Tool contract between the agent loop and repository actions
//!
//! A tool turns a JSON argument object into one or more remote calls and
//! returns a tagged result. Successful results and errors both end up as
//! text for the model, but callers that need to know which one they got
//! (tests, the procedure guard, the HTTP API) keep the typed channel.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result of a single tool invocation
pub type ToolResult = std::result::Result<String, ToolError>;

/// Errors reported by a tool
///
/// The `Display` form is exactly what the model sees as the observation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The remote platform rejected or failed the operation
    #[error("Error {action}: {message}")]
    Remote {
        /// What the tool was doing, e.g. "reading file"
        action: &'static str,
        /// Remote failure description
        message: String,
    },

    /// No usable credential was available; nothing was sent to the remote
    #[error("Error {action}: {message}")]
    Unauthenticated {
        /// What the tool was doing
        action: &'static str,
        /// Why the credential was rejected
        message: String,
    },

    /// The model supplied arguments that do not match the tool's schema
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments {
        /// Tool name
        tool: String,
        /// Deserialization failure
        message: String,
    },

    /// The model asked for a tool that is not registered
    #[error("Unknown tool '{0}'. Use one of the tools you were given.")]
    UnknownTool(String),

    /// The call was refused before execution (e.g. out of procedure order)
    #[error("Tool '{tool}' was not run: {reason}")]
    Rejected {
        /// Tool name
        tool: String,
        /// Why the call was refused
        reason: String,
    },
}

impl ToolError {
    /// Build a remote failure for the given action
    pub fn remote(action: &'static str, message: impl ToString) -> Self {
        ToolError::Remote {
            action,
            message: message.to_string(),
        }
    }

    /// Whether this error comes from malformed model output rather than
    /// from executing the tool
    pub fn is_parsing_error(&self) -> bool {
        matches!(
            self,
            ToolError::InvalidArguments { .. } | ToolError::UnknownTool(_)
        )
    }
}

/// Model-facing description of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters
    pub parameters: Value,
}

/// An action the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call this tool
    fn name(&self) -> &'static str;

    /// One-line description shown to the model
    fn description(&self) -> &'static str;

    /// JSON Schema of the argument object
    fn parameters_schema(&self) -> Value;

    /// Run the tool with model-supplied arguments
    async fn invoke(&self, args: Value) -> ToolResult;

    /// Model-facing definition
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize a tool's argument object
///
/// A missing/null argument object is treated as `{}` so tools without
/// required parameters accept it.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Ordered collection of tools available to one agent run
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    /// Create an empty tool set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any existing tool with the same name
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    /// Find a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions for every tool, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name
    pub async fn invoke(&self, name: &str, args: Value) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.invoke(args).await,
            None => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .finish()
    }
}
