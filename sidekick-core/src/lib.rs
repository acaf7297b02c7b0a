//! Sidekick Core - Core library for Code Sidekick
//!
//! This crate provides the pieces that turn a natural-language goal into a
//! sequence of repository actions: the session store holding user
//! credentials, the tool contract, the task prompt builder and the agent
//! loop that lets a language model drive the tools.

pub mod agent;
pub mod config;
pub mod error;
pub mod secrets;
pub mod session;
pub mod tool;

pub use agent::{
    build_goal, AgentExecutor, AgentRun, ChatModel, ExecutionTrace, OpenAiCompatModel,
    ProcedureGuard, ScriptedModel, TaskKind, TaskPhase, TaskRequest,
};
pub use config::Config;
pub use error::{Error, Result};
pub use secrets::Secrets;
pub use session::{new_session_id, MemorySessionStore, SessionStore};
pub use tool::{Tool, ToolDefinition, ToolError, ToolResult, ToolSet};
