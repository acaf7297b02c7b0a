//! Task command - Run a templated task against a repository

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Subcommand};
use sidekick_core::{build_goal, Config, TaskRequest};
use sidekick_server::GoalRunner;

use super::{local_runner, print_run};

/// Arguments for the task command
#[derive(Args, Debug)]
pub struct TaskArgs {
    /// Repository in owner/repo form
    #[arg(short, long, env = "SIDEKICK_REPO")]
    pub repo: String,

    /// Do not enforce the branch, explore, edit, pull request order
    #[arg(long, global = true)]
    pub no_guard: bool,

    /// Print the goal without running the agent
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub kind: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Implement a feature on a new branch and open a pull request
    #[command(visible_alias = "feat")]
    Feature {
        /// What the feature should do
        description: String,
    },

    /// Fix an issue on a fix/issue-N branch and open a pull request
    #[command(visible_alias = "fix")]
    Debug {
        /// Issue number to resolve
        issue: u64,

        /// Hints about where the bug is
        #[arg(short, long)]
        guidance: Option<String>,
    },

    /// Create or update a single file
    Write {
        /// Path of the file in the repository
        path: String,

        /// New file content
        #[arg(short, long, conflicts_with = "from_file", required_unless_present = "from_file")]
        content: Option<String>,

        /// Read the new content from a local file
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Commit message (defaults to "feat: Create or update <path>")
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Read a single file
    Read {
        /// Path of the file in the repository
        path: String,
    },

    /// Delete a single file
    Delete {
        /// Path of the file in the repository
        path: String,

        /// Commit message (defaults to "refactor: Delete <path>")
        #[arg(short, long)]
        message: Option<String>,
    },
}

impl TaskCommand {
    async fn into_request(self) -> anyhow::Result<TaskRequest> {
        Ok(match self {
            TaskCommand::Feature { description } => TaskRequest::Feature { description },
            TaskCommand::Debug { issue, guidance } => TaskRequest::Debug {
                issue_number: issue,
                guidance,
            },
            TaskCommand::Write {
                path,
                content,
                from_file,
                message,
            } => {
                let content = match (content, from_file) {
                    (Some(content), _) => content,
                    (None, Some(file)) => tokio::fs::read_to_string(&file)
                        .await
                        .with_context(|| format!("Failed to read {}", file.display()))?,
                    (None, None) => anyhow::bail!("Provide --content or --from-file"),
                };
                TaskRequest::FileWrite {
                    path,
                    content,
                    commit_message: message,
                }
            }
            TaskCommand::Read { path } => TaskRequest::FileRead { path },
            TaskCommand::Delete { path, message } => TaskRequest::FileDelete {
                path,
                commit_message: message,
            },
        })
    }
}

impl TaskArgs {
    /// Execute the task command
    pub async fn execute(self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let request = self.kind.into_request().await?;
        let goal = build_goal(&self.repo, &request)?;
        let guarded = !self.no_guard && request.kind().is_procedural();

        if verbose {
            tracing::info!(kind = %request.kind(), repo = %self.repo, guarded, "Starting task");
        }

        println!("Task: {} on {}", request.kind().label(), self.repo);
        println!();

        if self.dry_run {
            println!("[Dry run] Goal:");
            println!("{}", goal);
            return Ok(());
        }

        let (runner, token) = local_runner(config)?;
        let run = runner.run(&token, &goal, guarded).await?;
        print_run(&run, verbose);
        Ok(())
    }
}
