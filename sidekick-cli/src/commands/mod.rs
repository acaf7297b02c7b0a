//! CLI command implementations

pub mod config;
pub mod repos;
pub mod run;
pub mod serve;
pub mod task;

pub use config::ConfigArgs;
pub use repos::ReposArgs;
pub use run::RunArgs;
pub use serve::ServeArgs;
pub use task::TaskArgs;

use anyhow::Context;
use sidekick_core::{AgentRun, Config, Secrets};
use sidekick_server::GitHubAgentRunner;

/// Runner bound to the locally configured personal access token
pub(crate) fn local_runner(config: &Config) -> anyhow::Result<(GitHubAgentRunner, String)> {
    let secrets = Secrets::load().context("Failed to load secrets")?;

    let token = secrets.github_token().context(
        "GitHub token not found. Set GITHUB_PAT or add it to ~/.config/sidekick/secrets.toml",
    )?;

    if secrets.llm_api_key().is_none() {
        tracing::warn!("No LLM API key configured (SIDEKICK_API_KEY / GEMINI_API_KEY)");
    }

    let runner = GitHubAgentRunner::new(config.clone(), secrets.llm_api_key());
    Ok((runner, token))
}

/// Print the outcome of a run; the trace only in verbose mode
pub(crate) fn print_run(run: &AgentRun, verbose: bool) {
    if verbose {
        println!("Execution log");
        println!("=============");
        print!("{}", run.logs());
        println!();
    }

    println!("Result");
    println!("======");
    println!("{}", run.output);

    if !run.completed {
        println!();
        println!("(run did not finish after {} step(s))", run.iterations);
    }
    if let Some(phase) = run.procedure {
        println!("Procedure reached: {}", phase);
    }
}
