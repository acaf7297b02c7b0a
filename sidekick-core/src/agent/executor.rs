//! Agent executor: the decide → invoke → observe loop
//!
//! A run starts from a goal, repeatedly asks the model for its next step,
//! invokes the requested tools one at a time and feeds their results back,
//! until the model gives a final answer or the iteration budget runs out.
//! Failures of the loop itself never escape [`AgentExecutor::run`]: they
//! become the run's output together with whatever trace was captured.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::model::{ChatModel, Message, ToolCall};
use super::procedure::{ProcedureGuard, TaskPhase};
use super::trace::{ExecutionTrace, TraceKind};
use crate::config::AgentConfig;
use crate::tool::{ToolError, ToolResult, ToolSet};
use crate::{Error, Result};

const SYSTEM_PROMPT: &str = "You are Code Sidekick, an assistant that works on GitHub repositories \
through the tools you are given. Call tools one at a time and read every result: a result that \
starts with 'Error' means the action failed, so adapt or explain the failure. When the task is \
done, reply with your final answer as plain text.";

const EMPTY_REPLY_NUDGE: &str =
    "Your last reply was empty. Either call one of the tools or give your final answer.";

/// Outcome of one agent run
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Final answer, or the failure description
    pub output: String,
    /// Everything that happened during the run
    pub trace: ExecutionTrace,
    /// Decision steps taken
    pub iterations: usize,
    /// Whether the model produced a final answer
    pub completed: bool,
    /// Last procedure phase reached, when the guard was enabled
    pub procedure: Option<TaskPhase>,
}

impl AgentRun {
    /// Rendered trace
    pub fn logs(&self) -> String {
        self.trace.render()
    }
}

struct RunState {
    trace: ExecutionTrace,
    iterations: usize,
    guard: Option<ProcedureGuard>,
}

/// Drives a [`ChatModel`] over a [`ToolSet`]
pub struct AgentExecutor {
    model: Arc<dyn ChatModel>,
    tools: ToolSet,
    max_iterations: usize,
    handle_parsing_errors: bool,
    guarded: bool,
    system_prompt: String,
}

impl AgentExecutor {
    /// Create an executor with default limits
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolSet) -> Self {
        let defaults = AgentConfig::default();
        Self {
            model,
            tools,
            max_iterations: defaults.max_iterations,
            handle_parsing_errors: defaults.handle_parsing_errors,
            guarded: false,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// Create an executor using limits from the agent configuration
    pub fn from_config(model: Arc<dyn ChatModel>, tools: ToolSet, config: &AgentConfig) -> Self {
        Self::new(model, tools)
            .with_max_iterations(config.max_iterations)
            .with_parsing_errors(config.handle_parsing_errors)
    }

    /// Set the decision-step budget
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Feed malformed tool calls back to the model instead of failing the run
    pub fn with_parsing_errors(mut self, tolerate: bool) -> Self {
        self.handle_parsing_errors = tolerate;
        self
    }

    /// Enforce the branch → explore → edit → PR order
    pub fn with_procedure_guard(mut self, guarded: bool) -> Self {
        self.guarded = guarded;
        self
    }

    /// Replace the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Run the agent on a goal
    pub async fn run(&self, goal: &str) -> AgentRun {
        let mut state = RunState {
            trace: ExecutionTrace::new(),
            iterations: 0,
            guard: self.guarded.then(ProcedureGuard::new),
        };
        state.trace.push(TraceKind::Goal, None, goal);

        info!(model = %self.model.name(), tools = self.tools.len(), guarded = self.guarded, "Starting agent run");

        let result = self.drive(goal, &mut state).await;
        let procedure = state.guard.as_ref().map(|g| g.current_phase());

        match result {
            Ok(answer) => {
                info!(iterations = state.iterations, "Agent run finished");
                AgentRun {
                    output: answer,
                    trace: state.trace,
                    iterations: state.iterations,
                    completed: true,
                    procedure,
                }
            }
            Err(e) => {
                warn!(error = %e, iterations = state.iterations, "Agent run failed");
                state.trace.push(TraceKind::Error, None, e.to_string());
                AgentRun {
                    output: format!("An error occurred: {}", e),
                    trace: state.trace,
                    iterations: state.iterations,
                    completed: false,
                    procedure,
                }
            }
        }
    }

    async fn drive(&self, goal: &str, state: &mut RunState) -> Result<String> {
        let definitions = self.tools.definitions();
        let mut messages = vec![Message::system(&self.system_prompt), Message::user(goal)];

        for iteration in 0..self.max_iterations {
            state.iterations = iteration + 1;
            debug!(iteration = state.iterations, "Agent deciding");

            let reply = self.model.decide(&messages, &definitions).await?;

            if !reply.has_tool_calls() {
                let answer = reply.content.unwrap_or_default();
                if answer.trim().is_empty() {
                    if !self.handle_parsing_errors {
                        return Err(Error::Agent("model returned an empty response".to_string()));
                    }
                    state
                        .trace
                        .push(TraceKind::Error, None, "Empty model reply, asking again");
                    messages.push(Message::user(EMPTY_REPLY_NUDGE));
                    continue;
                }

                if let Some(guard) = state.guard.as_mut() {
                    if let Some(feedback) = guard.conclude().message() {
                        warn!(%feedback, "Procedure incomplete");
                        state.trace.push(
                            TraceKind::Error,
                            None,
                            format!("Procedure incomplete: {}", feedback),
                        );
                    }
                }

                state.trace.push(TraceKind::Answer, None, answer.as_str());
                return Ok(answer);
            }

            if let Some(text) = reply.content.as_deref().filter(|t| !t.trim().is_empty()) {
                state.trace.push(TraceKind::Thought, None, text);
            }

            messages.push(Message::assistant(
                reply.content.clone(),
                reply.tool_calls.clone(),
            ));

            // one call at a time, each observed before the next
            for call in &reply.tool_calls {
                let observation = self.invoke(call, state).await?;
                messages.push(Message::tool(&call.id, observation));
            }
        }

        Err(Error::Agent(format!(
            "Agent stopped after reaching the iteration limit ({})",
            self.max_iterations
        )))
    }

    async fn invoke(&self, call: &ToolCall, state: &mut RunState) -> Result<String> {
        state
            .trace
            .push(TraceKind::ToolCall, Some(&call.name), call.arguments.as_str());
        info!(tool = %call.name, "Invoking tool");

        let result: ToolResult = match parse_arguments(&call.arguments) {
            Err(e) => Err(ToolError::InvalidArguments {
                tool: call.name.clone(),
                message: format!("arguments are not valid JSON: {}", e),
            }),
            Ok(args) => {
                let refusal = state
                    .guard
                    .as_ref()
                    .and_then(|g| g.check(&call.name, &args).message().map(str::to_string));
                let result = match refusal {
                    Some(reason) => Err(ToolError::Rejected {
                        tool: call.name.clone(),
                        reason,
                    }),
                    None => self.tools.invoke(&call.name, args.clone()).await,
                };
                if let Some(guard) = state.guard.as_mut() {
                    guard.observe(&call.name, &args, &result);
                }
                result
            }
        };

        if let Err(e) = &result {
            if e.is_parsing_error() && !self.handle_parsing_errors {
                return Err(Error::Agent(e.to_string()));
            }
            debug!(tool = %call.name, error = %e, "Tool reported failure");
        }

        let observation = match result {
            Ok(text) => text,
            Err(e) => e.to_string(),
        };
        state
            .trace
            .push(TraceKind::Observation, Some(&call.name), observation.as_str());

        Ok(observation)
    }
}

fn parse_arguments(raw: &str) -> serde_json::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ScriptedModel;
    use crate::tool::{parse_args, Tool};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    /// Minimal tool standing in for a repository action
    struct Named {
        name: &'static str,
        fail: bool,
    }

    #[derive(Deserialize)]
    struct PathArgs {
        path: String,
    }

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "test tool"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]})
        }

        async fn invoke(&self, args: Value) -> ToolResult {
            let args: PathArgs = parse_args(self.name, args)?;
            if self.fail {
                Err(ToolError::remote("running tool", "boom"))
            } else {
                Ok(format!("{} ok: {}", self.name, args.path))
            }
        }
    }

    fn tools(names: &[&'static str]) -> ToolSet {
        names.iter().fold(ToolSet::new(), |set, name| {
            set.with(Arc::new(Named { name: *name, fail: false }))
        })
    }

    #[tokio::test]
    async fn test_single_tool_then_answer() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("read_file", json!({"path": "README.md"}))
                .then_answer("The file says hi"),
        );
        let executor = AgentExecutor::new(model.clone(), tools(&["read_file"]));

        let run = executor.run("read it").await;
        assert!(run.completed);
        assert_eq!(run.output, "The file says hi");
        assert_eq!(run.iterations, 2);
        assert_eq!(run.trace.count_calls("read_file"), 1);

        // the observation was fed back to the model
        let second = &model.transcripts()[1];
        let last = second.last().unwrap();
        assert_eq!(last.content.as_deref(), Some("read_file ok: README.md"));
        assert_eq!(last.tool_call_id.as_deref(), Some("call_0"));
    }

    #[tokio::test]
    async fn test_tool_error_is_observation() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("read_file", json!({"path": "x"}))
                .then_answer("could not read"),
        );
        let tools = ToolSet::new().with(Arc::new(Named {
            name: "read_file",
            fail: true,
        }));
        let run = AgentExecutor::new(model.clone(), tools).run("go").await;

        assert!(run.completed);
        let observed = model.transcripts()[1].last().unwrap().content.clone().unwrap();
        assert_eq!(observed, "Error running tool: boom");
    }

    #[tokio::test]
    async fn test_unknown_tool_tolerated() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("launch_rockets", json!({}))
                .then_answer("sorry"),
        );
        let run = AgentExecutor::new(model.clone(), tools(&["read_file"]))
            .run("go")
            .await;

        assert!(run.completed);
        let observed = model.transcripts()[1].last().unwrap().content.clone().unwrap();
        assert!(observed.contains("Unknown tool 'launch_rockets'"));
    }

    #[tokio::test]
    async fn test_parsing_error_aborts_when_not_tolerated() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("read_file", json!({"wrong": 1}))
                .then_answer("unreachable"),
        );
        let run = AgentExecutor::new(model, tools(&["read_file"]))
            .with_parsing_errors(false)
            .run("go")
            .await;

        assert!(!run.completed);
        assert!(run.output.starts_with("An error occurred:"));
        assert!(run.output.contains("Invalid arguments for tool 'read_file'"));
        assert_eq!(run.trace.count_calls("read_file"), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_arguments() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_reply(crate::agent::ModelReply::calls(vec![ToolCall::new(
                    "c1",
                    "read_file",
                    "{not json",
                )]))
                .then_answer("retried"),
        );
        let run = AgentExecutor::new(model.clone(), tools(&["read_file"]))
            .run("go")
            .await;
        assert!(run.completed);
        let observed = model.transcripts()[1].last().unwrap().content.clone().unwrap();
        assert!(observed.contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("read_file", json!({"path": "a"}))
                .then_call("read_file", json!({"path": "b"}))
                .then_call("read_file", json!({"path": "c"})),
        );
        let run = AgentExecutor::new(model, tools(&["read_file"]))
            .with_max_iterations(2)
            .run("go")
            .await;

        assert!(!run.completed);
        assert!(run.output.contains("iteration limit (2)"));
        assert_eq!(run.iterations, 2);
        assert_eq!(run.trace.count_calls("read_file"), 2);
    }

    #[tokio::test]
    async fn test_model_failure_keeps_trace() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("read_file", json!({"path": "a"}))
                .then_fail("HTTP 429 - quota"),
        );
        let run = AgentExecutor::new(model, tools(&["read_file"])).run("go").await;

        assert!(!run.completed);
        assert_eq!(run.output, "An error occurred: LLM error: HTTP 429 - quota");
        assert_eq!(run.trace.count_calls("read_file"), 1);
        assert!(run.logs().contains("HTTP 429"));
    }

    #[tokio::test]
    async fn test_empty_reply_nudged() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_answer("   ")
                .then_answer("done"),
        );
        let run = AgentExecutor::new(model.clone(), ToolSet::new()).run("go").await;
        assert!(run.completed);
        assert_eq!(run.output, "done");
        let nudged = model.transcripts()[1].last().unwrap().content.clone().unwrap();
        assert_eq!(nudged, EMPTY_REPLY_NUDGE);
    }

    #[tokio::test]
    async fn test_guard_rejects_out_of_order_edit() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call("create_or_update_file", json!({"path": "a.rs"}))
                .then_answer("gave up"),
        );
        let run = AgentExecutor::new(model.clone(), tools(&["create_or_update_file"]))
            .with_procedure_guard(true)
            .run("go")
            .await;

        let observed = model.transcripts()[1].last().unwrap().content.clone().unwrap();
        assert!(observed.starts_with("Tool 'create_or_update_file' was not run"));
        assert_eq!(run.procedure, Some(TaskPhase::Started));
        assert!(run.logs().contains("Procedure incomplete"));
    }

    #[tokio::test]
    async fn test_guard_full_sequence() {
        let model = Arc::new(
            ScriptedModel::new()
                .then_call(
                    "create_branch",
                    json!({"path": "fix/issue-1", "branch_name": "fix/issue-1"}),
                )
                .then_call("list_repository_files", json!({"path": "."}))
                .then_call(
                    "create_or_update_file",
                    json!({"path": "a.rs", "branch": "fix/issue-1"}),
                )
                .then_call(
                    "create_pull_request",
                    json!({"path": "fix/issue-1", "head_branch": "fix/issue-1"}),
                )
                .then_answer("PR #1 opened"),
        );
        let run = AgentExecutor::new(
            model,
            tools(&[
                "create_branch",
                "list_repository_files",
                "create_or_update_file",
                "create_pull_request",
            ]),
        )
        .with_procedure_guard(true)
        .run("go")
        .await;

        assert!(run.completed);
        assert_eq!(run.procedure, Some(TaskPhase::Reported));
        assert!(!run.logs().contains("Procedure incomplete"));
    }
}
