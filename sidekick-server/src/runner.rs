//! Runs goals on behalf of a session's credential

use std::sync::Arc;

use async_trait::async_trait;
use sidekick_core::{AgentExecutor, AgentRun, Config, OpenAiCompatModel};
use sidekick_github::{github_tools, list_repositories_fail_open, GitHubClient, RepositoryHost};
use tracing::info;

/// Executes work with a user's access token
#[async_trait]
pub trait GoalRunner: Send + Sync {
    /// Repository names, or a single `Error listing repositories: ...` entry
    async fn list_repositories(&self, token: &str) -> Vec<String>;

    /// Run the agent on a goal with the GitHub tools bound to `token`
    async fn run(&self, token: &str, goal: &str, guarded: bool) -> sidekick_core::Result<AgentRun>;
}

/// Production runner: GitHub tools driven by an OpenAI-compatible model
pub struct GitHubAgentRunner {
    config: Config,
    api_key: Option<String>,
}

impl GitHubAgentRunner {
    pub fn new(config: Config, api_key: Option<String>) -> Self {
        Self { config, api_key }
    }

    fn host(&self, token: &str) -> sidekick_core::Result<Arc<dyn RepositoryHost>> {
        match GitHubClient::with_token(token, self.config.github.api_url.as_deref()) {
            Ok(client) => Ok(Arc::new(client)),
            Err(sidekick_github::Error::Auth(_)) => Err(sidekick_core::Error::Unauthenticated),
            Err(e) => Err(sidekick_core::Error::Other(e.to_string())),
        }
    }
}

#[async_trait]
impl GoalRunner for GitHubAgentRunner {
    async fn list_repositories(&self, token: &str) -> Vec<String> {
        match self.host(token) {
            Ok(host) => list_repositories_fail_open(host.as_ref()).await,
            Err(e) => vec![format!("Error listing repositories: {}", e)],
        }
    }

    async fn run(&self, token: &str, goal: &str, guarded: bool) -> sidekick_core::Result<AgentRun> {
        let host = self.host(token)?;
        let model = OpenAiCompatModel::from_config(&self.config.agent, self.api_key.clone())?;

        let executor = AgentExecutor::from_config(Arc::new(model), github_tools(host), &self.config.agent)
            .with_procedure_guard(guarded);

        let run = executor.run(goal).await;
        info!(
            completed = run.completed,
            iterations = run.iterations,
            tool_calls = run.trace.tool_calls().len(),
            "Goal finished"
        );
        Ok(run)
    }
}
