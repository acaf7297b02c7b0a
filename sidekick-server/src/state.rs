//! Shared handler state

use std::sync::Arc;

use sidekick_core::{Config, MemorySessionStore, Secrets, SessionStore};

use crate::{GitHubAgentRunner, GoalRunner, OAuthClient};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub runner: Arc<dyn GoalRunner>,
    pub oauth: Arc<OAuthClient>,
    /// Front end the OAuth callback redirects back to
    pub frontend_url: String,
}

impl AppState {
    /// Production state: in-memory sessions and the GitHub agent runner
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        let runner = GitHubAgentRunner::new(config.clone(), secrets.llm_api_key());
        Self::new(config, secrets, Arc::new(runner))
    }

    /// State with a custom runner
    pub fn new(config: &Config, secrets: &Secrets, runner: Arc<dyn GoalRunner>) -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new()),
            runner,
            oauth: Arc::new(OAuthClient::new(
                &config.github,
                secrets.github_client_secret(),
            )),
            frontend_url: config.server.frontend_url.clone(),
        }
    }
}
