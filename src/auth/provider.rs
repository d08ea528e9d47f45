//! Identity provider integration
//!
//! [`IdentityProvider`] is the seam between the route handlers and the
//! three-legged OAuth exchange. [`GitHubProvider`] implements the
//! authorization code flow against GitHub.

use axum::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use url::Url;

use super::profile::{GitHubUser, UserProfile};
use crate::config::{GitHubOAuthConfig, ServerConfig};
use crate::error::AppError;

/// Third-party identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL to send the browser to, carrying the CSRF `state`
    fn authorization_url(&self, state: &str) -> Url;

    /// Exchange a temporary authorization code for the user's profile
    async fn complete(&self, code: &str) -> Result<UserProfile, AppError>;
}

/// GitHub token endpoint response
///
/// GitHub answers failed exchanges with 200 and an `error` body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitHubTokenResponse {
    Token {
        access_token: String,
        #[allow(dead_code)]
        token_type: String,
        #[allow(dead_code)]
        #[serde(default)]
        scope: String,
    },
    Error {
        error: String,
        error_description: Option<String>,
    },
}

/// GitHub OAuth app
pub struct GitHubProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    scope: String,
    redirect_uri: String,
    authorize_url: Url,
    token_url: Url,
    user_url: Url,
}

impl GitHubProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    /// Returns `Config` if an endpoint URL does not parse
    pub fn new(
        config: &GitHubOAuthConfig,
        server: &ServerConfig,
        client: reqwest::Client,
    ) -> Result<Self, AppError> {
        let parse = |key: &str, value: &str| {
            Url::parse(value).map_err(|e| AppError::Config(format!("{key}: {e}")))
        };

        let api_root = config.api_url.trim_end_matches('/');

        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            redirect_uri: config.redirect_uri(server),
            authorize_url: parse("auth.github.authorize_url", &config.authorize_url)?,
            token_url: parse("auth.github.token_url", &config.token_url)?,
            user_url: parse("auth.github.api_url", &format!("{api_root}/user"))?,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?
            .error_for_status()?;

        match response.json::<GitHubTokenResponse>().await? {
            GitHubTokenResponse::Token { access_token, .. } => Ok(access_token),
            GitHubTokenResponse::Error {
                error,
                error_description,
            } => Err(AppError::Provider(match error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            })),
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GitHubUser, AppError> {
        let user = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("gitgate/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?
            .error_for_status()?
            .json::<GitHubUser>()
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl IdentityProvider for GitHubProvider {
    fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        url
    }

    async fn complete(&self, code: &str) -> Result<UserProfile, AppError> {
        let access_token = self.exchange_code(code).await?;
        let user = self.fetch_user(&access_token).await?;
        let profile = UserProfile::try_from(user)?;

        tracing::debug!(login = %profile.login, id = profile.id, "Fetched GitHub profile");
        Ok(profile)
    }
}
