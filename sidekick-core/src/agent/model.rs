//! Chat model abstraction used by the agent loop
//!
//! The executor only needs one capability from a language model: given
//! the conversation so far and the available tools, either request tool
//! calls or give a final answer. Any model (remote API, scripted replay)
//! that can do that plugs in through [`ChatModel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::tool::ToolDefinition;
use crate::Result;

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back with the result
    pub id: String,
    /// Tool name
    pub name: String,
    /// Raw JSON argument string as produced by the model
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Assistant turn that requested tool calls
    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Result of a tool call
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// What the model decided to do next
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Text content, the final answer when no tool calls are present
    pub content: Option<String>,
    /// Requested tool calls, executed in order
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    /// A reply that concludes the run
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply that requests tool calls
    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    /// Whether the model wants to invoke tools
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Decision interface: given the conversation and tools, produce the
/// next action or a final answer
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging
    fn name(&self) -> &str;

    /// Ask the model for its next step
    async fn decide(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<ModelReply>;
}
