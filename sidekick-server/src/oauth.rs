//! GitHub OAuth web flow

use serde::Deserialize;
use sidekick_core::config::GitHubConfig;
use tracing::{debug, info};
use url::Url;

use crate::{Result, ServerError};

/// OAuth application settings and the token exchange
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: Option<String>,
    client_secret: Option<String>,
    authorize_url: String,
    token_url: String,
    scope: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthClient {
    pub fn new(config: &GitHubConfig, client_secret: Option<String>) -> Self {
        Self {
            client_id: config.client_id.clone().filter(|id| !id.trim().is_empty()),
            client_secret,
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            scope: config.scope.clone(),
            http: reqwest::Client::new(),
        }
    }

    fn client_id(&self) -> Result<&str> {
        self.client_id.as_deref().ok_or_else(|| {
            ServerError::NotConfigured("GitHub OAuth client id is not set".to_string())
        })
    }

    /// Where to send the browser to start the login
    pub fn authorize_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.authorize_url).map_err(|e| {
            ServerError::NotConfigured(format!(
                "invalid authorize URL '{}': {}",
                self.authorize_url, e
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", self.client_id()?)
            .append_pair("scope", &self.scope);
        Ok(url)
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let client_id = self.client_id()?;
        let client_secret = self.client_secret.as_deref().ok_or_else(|| {
            ServerError::NotConfigured("GitHub OAuth client secret is not set".to_string())
        })?;

        debug!(token_url = %self.token_url, "Exchanging OAuth code");
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| ServerError::OAuth(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServerError::OAuth(e.to_string()))?;

        if !status.is_success() {
            return Err(ServerError::OAuth(format!("HTTP {} - {}", status.as_u16(), body)));
        }

        let token = parse_token_response(&body)?;
        info!("OAuth code exchanged");
        Ok(token)
    }
}

fn parse_token_response(body: &str) -> Result<String> {
    let response: TokenResponse =
        serde_json::from_str(body).map_err(|e| ServerError::OAuth(e.to_string()))?;

    match response.access_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok(token),
        None => Err(ServerError::OAuth(
            response
                .error_description
                .or(response.error)
                .unwrap_or_else(|| "no access token in response".to_string()),
        )),
    }
}
