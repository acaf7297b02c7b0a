//! Secrets management for Code Sidekick
//!
//! Secrets are stored separately from configuration to avoid accidental sharing.
//! The secrets file is located at `~/.config/sidekick/secrets.toml` and must have
//! restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_PAT, GITHUB_CLIENT_SECRET, GEMINI_API_KEY, ...)
//! 2. Secrets file (~/.config/sidekick/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub configuration
    pub github: GitHubSecrets,

    /// Language model configuration
    pub llm: LlmSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Personal Access Token used by the terminal front end
    pub token: Option<String>,

    /// OAuth application secret used by the HTTP callback
    pub client_secret: Option<String>,
}

/// Language model secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSecrets {
    /// API key for the chat-completion provider
    pub api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        let secrets_path = Self::default_secrets_path();

        if let Some(path) = secrets_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        // Check file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            // Check if file is readable by group or others (mode & 0o077)
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        for value in [
            &mut secrets.github.token,
            &mut secrets.github.client_secret,
            &mut secrets.llm.api_key,
        ] {
            if let Some(v) = value {
                *v = v.trim().to_string();
            }
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/sidekick/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sidekick").join("secrets.toml"))
    }

    /// Get the GitHub Personal Access Token
    ///
    /// Priority: GITHUB_PAT > GITHUB_TOKEN > secrets file
    pub fn github_token(&self) -> Option<String> {
        first_env(&["GITHUB_PAT", "GITHUB_TOKEN"]).or_else(|| non_empty(&self.github.token))
    }

    /// Get the OAuth client secret
    ///
    /// Priority: GITHUB_CLIENT_SECRET > secrets file
    pub fn github_client_secret(&self) -> Option<String> {
        first_env(&["GITHUB_CLIENT_SECRET"]).or_else(|| non_empty(&self.github.client_secret))
    }

    /// Get the chat-completion API key
    ///
    /// Priority: SIDEKICK_API_KEY > GEMINI_API_KEY > secrets file
    pub fn llm_api_key(&self) -> Option<String> {
        first_env(&["SIDEKICK_API_KEY", "GEMINI_API_KEY"]).or_else(|| non_empty(&self.llm.api_key))
    }

    /// Create a template secrets file at the default location
    ///
    /// Creates parent directories if needed and sets secure permissions
    pub fn create_template() -> Result<PathBuf> {
        let path = Self::default_secrets_path()
            .ok_or_else(|| Error::Config("Could not determine secrets path".to_string()))?;

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        // Don't overwrite existing file
        if path.exists() {
            return Err(Error::Config(format!(
                "Secrets file already exists at {}",
                path.display()
            )));
        }

        let template = r#"# Code Sidekick Secrets
# This file contains sensitive credentials - do not share or commit to version control
#
# IMPORTANT: This file must have restrictive permissions (chmod 600)

[github]
# Personal Access Token with `repo` scope, used by `sidekick task` and `sidekick run`
# Create at: https://github.com/settings/tokens
token = ""
# OAuth application secret, used by `sidekick serve` for /callback
client_secret = ""

[llm]
# API key for the chat-completion provider (Gemini by default)
api_key = ""
"#;

        std::fs::write(&path, template).map_err(Error::Io)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(Error::Io)?;
        }

        warn!(path = %path.display(), "Created secrets template - please edit and add your tokens");

        Ok(path)
    }
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let value = std::env::var(name).ok()?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            debug!(var = %name, "Using secret from environment");
            Some(value.to_string())
        }
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
