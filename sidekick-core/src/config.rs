//! Configuration management for Code Sidekick
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (SIDEKICK_*)
//! 3. Config file (~/.config/sidekick/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Where the OAuth callback sends the browser once a session exists
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            frontend_url: "http://localhost:8501".to_string(),
        }
    }
}

/// GitHub API and OAuth application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API root (override for GitHub Enterprise)
    pub api_url: Option<String>,

    /// OAuth application client id
    pub client_id: Option<String>,

    /// OAuth authorization endpoint
    pub authorize_url: String,

    /// OAuth token exchange endpoint
    pub token_url: String,

    /// Scope requested during login
    pub scope: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            client_id: None,
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            scope: "repo".to_string(),
        }
    }
}

/// Agent and language model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Chat-completion model name
    pub model: String,

    /// Base URL of an OpenAI-compatible chat-completion API
    pub base_url: String,

    /// Maximum decide/invoke rounds before a run is abandoned
    pub max_iterations: usize,

    /// Feed malformed tool calls back to the model instead of aborting
    pub handle_parsing_errors: bool,

    /// Timeout for a single model request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-lite".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            max_iterations: 15,
            handle_parsing_errors: true,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// GitHub configuration
    pub github: GitHubConfig,

    /// Agent configuration
    pub agent: AgentConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/sidekick/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sidekick").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - SIDEKICK_MODEL: Model to use
    /// - SIDEKICK_BASE_URL: Chat-completion API root
    /// - SIDEKICK_HOST / SIDEKICK_PORT: Server bind address
    /// - SIDEKICK_FRONTEND_URL: Redirect target after login
    /// - GITHUB_CLIENT_ID: OAuth application id
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SIDEKICK_MODEL") {
            self.agent.model = model;
        }

        if let Ok(base_url) = std::env::var("SIDEKICK_BASE_URL") {
            self.agent.base_url = base_url;
        }

        if let Ok(host) = std::env::var("SIDEKICK_HOST") {
            self.server.host = host;
        }

        if let Some(port) = std::env::var("SIDEKICK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }

        if let Ok(url) = std::env::var("SIDEKICK_FRONTEND_URL") {
            self.server.frontend_url = url;
        }

        if let Ok(client_id) = std::env::var("GITHUB_CLIENT_ID") {
            if !client_id.trim().is_empty() {
                self.github.client_id = Some(client_id.trim().to_string());
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, model: Option<String>, port: Option<u16>) -> Self {
        if let Some(m) = model {
            self.agent.model = m;
        }

        if let Some(p) = port {
            self.server.port = p;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        path: Option<&Path>,
        model: Option<String>,
        port: Option<u16>,
    ) -> Result<Self> {
        let base = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::load()?,
        };
        Ok(base.with_env_overrides().with_cli_overrides(model, port))
    }
}
