//! Agent module: task prompts, model abstraction and the tool-calling loop

mod executor;
mod model;
mod openai;
mod procedure;
mod prompts;
mod scripted;
mod trace;
mod types;

pub use executor::{AgentExecutor, AgentRun};
pub use model::{ChatModel, Message, ModelReply, Role, ToolCall};
pub use openai::OpenAiCompatModel;
pub use procedure::{PhaseValidation, ProcedureGuard, TaskPhase};
pub use prompts::{build_goal, get_template, render, PromptContext};
pub use scripted::ScriptedModel;
pub use trace::{ExecutionTrace, TraceEntry, TraceKind};
pub use types::{TaskKind, TaskRequest};
