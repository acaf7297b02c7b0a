//! Step sequencing for branch → edit → pull request tasks
//!
//! The feature and debug prompts ask the model to follow an ordered
//! procedure. The guard tracks which step has actually been completed,
//! judged by successful tool results, and refuses mutating tool calls that
//! would skip ahead. Once a working branch exists, edits and the pull
//! request must name it. Read-only tools are never refused.

use std::fmt;

use serde_json::Value;

use crate::tool::ToolResult;
use crate::{Error, Result};

/// Validation result for a procedure step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseValidation {
    /// Step is allowed / procedure complete
    Valid,
    /// Step is not allowed in the current phase
    Invalid { reason: String },
    /// Procedure ended before reaching its last step
    NeedsWork { feedback: String },
}

impl PhaseValidation {
    /// Check if the validation is successful (Valid)
    pub fn is_valid(&self) -> bool {
        matches!(self, PhaseValidation::Valid)
    }

    /// Get the reason/feedback message if available
    pub fn message(&self) -> Option<&str> {
        match self {
            PhaseValidation::Valid => None,
            PhaseValidation::Invalid { reason } => Some(reason),
            PhaseValidation::NeedsWork { feedback } => Some(feedback),
        }
    }
}

/// Completed step of the procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    Started,
    BranchCreated,
    FilesExplored,
    EditApplied,
    PrOpened,
    Reported,
}

impl TaskPhase {
    /// What the model should do next from this phase
    fn next_step(&self) -> &'static str {
        match self {
            TaskPhase::Started => "create the working branch with `create_branch`",
            TaskPhase::BranchCreated => {
                "explore the repository with `list_repository_files` or `read_file`"
            }
            TaskPhase::FilesExplored => "apply the change with `create_or_update_file`",
            TaskPhase::EditApplied => "open the pull request with `create_pull_request`",
            TaskPhase::PrOpened => "report the pull request number and URL",
            TaskPhase::Reported => "nothing, the procedure is complete",
        }
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::Started => "started",
            TaskPhase::BranchCreated => "branch created",
            TaskPhase::FilesExplored => "files explored",
            TaskPhase::EditApplied => "edit applied",
            TaskPhase::PrOpened => "pull request opened",
            TaskPhase::Reported => "reported",
        };
        write!(f, "{}", name)
    }
}

/// How a tool call relates to the procedure
enum StepKind {
    /// Moves the procedure forward and is refused out of order
    Mutating(TaskPhase),
    /// Always allowed; advances `BranchCreated` to `FilesExplored`
    Exploring,
    /// Always allowed; no effect on the phase
    Neutral,
}

fn step_kind(tool: &str) -> StepKind {
    match tool {
        "create_branch" => StepKind::Mutating(TaskPhase::BranchCreated),
        "create_or_update_file" | "delete_file" => StepKind::Mutating(TaskPhase::EditApplied),
        "create_pull_request" => StepKind::Mutating(TaskPhase::PrOpened),
        "list_repository_files" | "read_file" => StepKind::Exploring,
        _ => StepKind::Neutral,
    }
}

/// Argument carrying the branch a mutating tool acts on
fn branch_key(tool: &str) -> Option<&'static str> {
    match tool {
        "create_branch" => Some("branch_name"),
        "create_or_update_file" | "delete_file" => Some("branch"),
        "create_pull_request" => Some("head_branch"),
        _ => None,
    }
}

fn branch_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|b| !b.is_empty())
}

/// State machine enforcing the branch → explore → edit → PR → report order
#[derive(Debug, Clone)]
pub struct ProcedureGuard {
    current_phase: TaskPhase,
    working_branch: Option<String>,
    valid_transitions: Vec<(TaskPhase, TaskPhase)>,
}

impl Default for ProcedureGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcedureGuard {
    /// Create a guard at [`TaskPhase::Started`]
    pub fn new() -> Self {
        use TaskPhase::*;
        Self {
            current_phase: Started,
            working_branch: None,
            valid_transitions: vec![
                (Started, BranchCreated),
                (BranchCreated, FilesExplored),
                (FilesExplored, EditApplied),
                (EditApplied, EditApplied),
                (EditApplied, PrOpened),
                (PrOpened, Reported),
            ],
        }
    }

    pub fn current_phase(&self) -> TaskPhase {
        self.current_phase
    }

    /// Branch created by the procedure, once `create_branch` succeeded
    pub fn working_branch(&self) -> Option<&str> {
        self.working_branch.as_deref()
    }

    /// Check if a transition to the given phase is valid
    pub fn can_transition_to(&self, phase: TaskPhase) -> bool {
        self.valid_transitions
            .iter()
            .any(|(f, t)| *f == self.current_phase && *t == phase)
    }

    fn transition_to(&mut self, phase: TaskPhase) -> Result<()> {
        if !self.can_transition_to(phase) {
            return Err(Error::Agent(format!(
                "Invalid transition from {:?} to {:?}",
                self.current_phase, phase
            )));
        }

        tracing::info!(
            from = ?self.current_phase,
            to = ?phase,
            "Procedure phase transition"
        );

        self.current_phase = phase;
        Ok(())
    }

    /// Decide whether a tool may run now with the given arguments
    pub fn check(&self, tool: &str, args: &Value) -> PhaseValidation {
        match step_kind(tool) {
            StepKind::Mutating(target) if !self.can_transition_to(target) => {
                PhaseValidation::Invalid {
                    reason: format!(
                        "the procedure is at step '{}'; next you must {}",
                        self.current_phase,
                        self.current_phase.next_step()
                    ),
                }
            }
            StepKind::Mutating(TaskPhase::EditApplied | TaskPhase::PrOpened) => {
                self.check_branch(tool, args)
            }
            _ => PhaseValidation::Valid,
        }
    }

    fn check_branch(&self, tool: &str, args: &Value) -> PhaseValidation {
        let (Some(key), Some(expected)) = (branch_key(tool), self.working_branch.as_deref()) else {
            return PhaseValidation::Valid;
        };

        match branch_arg(args, key) {
            Some(branch) if branch == expected => PhaseValidation::Valid,
            Some(branch) => PhaseValidation::Invalid {
                reason: format!(
                    "`{}` is '{}' but changes must go to the working branch '{}'",
                    key, branch, expected
                ),
            },
            None => PhaseValidation::Invalid {
                reason: format!("set `{}` to the working branch '{}'", key, expected),
            },
        }
    }

    /// Record a tool result; only successful results advance the phase
    pub fn observe(&mut self, tool: &str, args: &Value, result: &ToolResult) {
        if result.is_err() {
            return;
        }

        if tool == "create_branch" && self.current_phase == TaskPhase::Started {
            self.working_branch = branch_arg(args, "branch_name").map(str::to_string);
        }

        let target = match step_kind(tool) {
            StepKind::Mutating(target) => target,
            StepKind::Exploring if self.current_phase == TaskPhase::BranchCreated => {
                TaskPhase::FilesExplored
            }
            _ => return,
        };

        if let Err(e) = self.transition_to(target) {
            tracing::debug!(error = %e, tool, "Tool result did not advance procedure");
        }
    }

    /// Mark the final answer; reports whether the procedure was completed
    pub fn conclude(&mut self) -> PhaseValidation {
        if self.current_phase == TaskPhase::PrOpened && self.transition_to(TaskPhase::Reported).is_ok()
        {
            return PhaseValidation::Valid;
        }

        PhaseValidation::NeedsWork {
            feedback: format!(
                "procedure ended at step '{}' without opening a pull request",
                self.current_phase
            ),
        }
    }
}
