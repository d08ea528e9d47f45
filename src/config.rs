//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET`
//! 3. Configuration files (config/default.toml, config/local.toml)
//! 4. Environment variables (GITGATE__*, override)

use serde::Deserialize;
use std::net::IpAddr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 3000)
    pub port: u16,
    /// Public domain, optionally with port (e.g., "localhost:3000")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the public base URL
    ///
    /// # Returns
    /// Full URL like "http://localhost:3000"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session cookies (32+ bytes)
    ///
    /// Sessions live in process memory, so a random secret is generated
    /// at startup when this is not set.
    pub session_secret: Option<String>,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    pub github: GitHubOAuthConfig,
}

/// GitHub OAuth application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Requested permission scope (default: "user")
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
    /// REST API root; the profile is read from `{api_url}/user`
    pub api_url: String,
    /// Registered callback URL. Defaults to `{base_url}/auth/github/callback`.
    pub callback_url: Option<String>,
}

impl GitHubOAuthConfig {
    /// Callback URL GitHub redirects back to after authorization
    pub fn redirect_uri(&self, server: &ServerConfig) -> String {
        self.callback_url
            .clone()
            .unwrap_or_else(|| format!("{}/auth/github/callback", server.base_url()))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET
    /// 3. config/default.toml (if exists)
    /// 4. config/local.toml (if exists)
    /// 5. Environment variables (GITGATE__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.domain", "localhost:3000")?
            .set_default("server.protocol", "http")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("auth.github.scope", "user")?
            .set_default(
                "auth.github.authorize_url",
                "https://github.com/login/oauth/authorize",
            )?
            .set_default(
                "auth.github.token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("auth.github.api_url", "https://api.github.com")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        for (key, var) in [
            ("auth.github.client_id", "GITHUB_CLIENT_ID"),
            ("auth.github.client_secret", "GITHUB_CLIENT_SECRET"),
        ] {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config = builder
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("GITGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        const MIN_SESSION_SECRET_BYTES: usize = 32;
        const MAX_SESSION_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

        let github = &self.auth.github;
        if github.client_id.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_id is required (set GITHUB_CLIENT_ID)".to_string(),
            ));
        }
        if github.client_secret.trim().is_empty() {
            return Err(AppError::Config(
                "auth.github.client_secret is required (set GITHUB_CLIENT_SECRET)".to_string(),
            ));
        }

        if let Some(secret) = &self.auth.session_secret {
            if secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
                return Err(AppError::Config(format!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SESSION_SECRET_BYTES
                )));
            }
        }

        if self.auth.session_max_age <= 0 {
            return Err(AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.auth.session_max_age > MAX_SESSION_MAX_AGE_SECS {
            return Err(AppError::Config(format!(
                "auth.session_max_age must be at most {MAX_SESSION_MAX_AGE_SECS} seconds"
            )));
        }

        for (key, value) in [
            ("auth.github.authorize_url", github.authorize_url.as_str()),
            ("auth.github.token_url", github.token_url.as_str()),
            ("auth.github.api_url", github.api_url.as_str()),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{key} is not a valid URL: {e}")))?;
        }

        if self.should_use_secure_cookies() && !self.server.protocol.eq_ignore_ascii_case("https")
        {
            return Err(AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
