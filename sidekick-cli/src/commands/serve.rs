//! Serve command - Run the HTTP API

use std::net::SocketAddr;

use anyhow::Context;
use clap::Args;
use sidekick_core::{Config, Secrets};
use sidekick_server::AppState;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config and env)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let secrets = Secrets::load().context("Failed to load secrets")?;

        if config.github.client_id.is_none() || secrets.github_client_secret().is_none() {
            tracing::warn!(
                "GitHub OAuth is not configured (GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET); \
                 /login will fail, use POST /session with a token instead"
            );
        }
        if secrets.llm_api_key().is_none() {
            tracing::warn!("No LLM API key configured (SIDEKICK_API_KEY / GEMINI_API_KEY)");
        }

        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let addr: SocketAddr = format!("{}:{}", host, config.server.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", host, config.server.port))?;

        let state = AppState::from_config(config, &secrets);
        sidekick_server::serve(state, addr).await?;
        Ok(())
    }
}
