//! Repos command - List accessible repositories

use clap::Args;
use sidekick_core::Config;
use sidekick_github::listing_failure;
use sidekick_server::GoalRunner;

use super::local_runner;

/// Arguments for the repos command
#[derive(Args, Debug)]
pub struct ReposArgs {
    /// Only show repositories whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,
}

impl ReposArgs {
    /// Execute the repos command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let (runner, token) = local_runner(config)?;
        let repos = runner.list_repositories(&token).await;

        if let Some(error) = listing_failure(&repos) {
            anyhow::bail!("{}", error);
        }

        let needle = self.filter.as_deref().unwrap_or_default().to_lowercase();
        let shown: Vec<&String> = repos
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();

        for name in &shown {
            println!("{}", name);
        }
        println!();
        println!("{} of {} repositories", shown.len(), repos.len());
        Ok(())
    }
}
