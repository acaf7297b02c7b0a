//! Config command - Show the effective configuration

use std::path::Path;

use clap::Args;
use sidekick_core::{Config, Secrets};

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Create ~/.config/sidekick/secrets.toml from a template
    #[arg(long)]
    pub init_secrets: bool,
}

fn presence(value: Option<String>) -> &'static str {
    if value.is_some() {
        "(set)"
    } else {
        "(not set)"
    }
}

impl ConfigArgs {
    /// Execute the config command
    pub fn execute(&self, config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
        if self.init_secrets {
            let path = Secrets::create_template()?;
            println!("Secrets template written to {}", path.display());
            println!("Fill in your tokens; the file must stay readable by you only (0600).");
            return Ok(());
        }

        println!("Sidekick Configuration");
        println!("======================");
        println!();
        println!("Server Settings:");
        println!("  host: {}", config.server.host);
        println!("  port: {}", config.server.port);
        println!("  frontend_url: {}", config.server.frontend_url);
        println!();
        println!("GitHub Settings:");
        println!(
            "  api_url: {}",
            config.github.api_url.as_deref().unwrap_or("(default)")
        );
        println!(
            "  client_id: {}",
            config.github.client_id.as_deref().unwrap_or("(not set)")
        );
        println!("  scope: {}", config.github.scope);
        println!();
        println!("Agent Settings:");
        println!("  model: {}", config.agent.model);
        println!("  base_url: {}", config.agent.base_url);
        println!("  max_iterations: {}", config.agent.max_iterations);
        println!("  handle_parsing_errors: {}", config.agent.handle_parsing_errors);
        println!("  timeout: {:?}", config.agent.timeout);
        println!();

        match Secrets::load() {
            Ok(secrets) => {
                println!("Secrets:");
                println!("  github token: {}", presence(secrets.github_token()));
                println!(
                    "  oauth client secret: {}",
                    presence(secrets.github_client_secret())
                );
                println!("  llm api key: {}", presence(secrets.llm_api_key()));
            }
            Err(e) => println!("Secrets: failed to load ({})", e),
        }
        println!();

        let file = path
            .map(Path::to_path_buf)
            .or_else(Config::default_config_path);
        if let Some(file) = file {
            println!("Config file: {}", file.display());
            if file.exists() {
                println!("  (exists)");
            } else {
                println!("  (not found - using defaults)");
            }
        }

        Ok(())
    }
}
