//! Run command - Execute a free-form goal

use clap::Args;
use sidekick_core::Config;
use sidekick_server::GoalRunner;

use super::{local_runner, print_run};

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// What the agent should accomplish
    #[arg(required = true)]
    pub goal: String,

    /// Enforce the branch, explore, edit, pull request order
    #[arg(long)]
    pub guarded: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        if self.goal.trim().is_empty() {
            anyhow::bail!("Goal must not be empty");
        }

        let (runner, token) = local_runner(config)?;

        if verbose {
            tracing::info!(goal = %self.goal, guarded = self.guarded, "Starting agent run");
        }

        let run = runner.run(&token, &self.goal, self.guarded).await?;
        print_run(&run, verbose);
        Ok(())
    }
}
