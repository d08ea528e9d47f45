//! gitgate - A minimal web app demonstrating GitHub OAuth login
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - Pages: /, /login, /account                               │
//! │  - OAuth: /auth/github, /auth/github/callback, /logout      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Authentication Gate                        │
//! │  - Signed session cookie → SessionStore lookup              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │  SessionStore (Moka, TTL)    │ │  IdentityProvider (GitHub) │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTML pages and the metrics endpoint
//! - `auth`: GitHub OAuth, sessions, authentication gate
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Server-side sessions keyed by session ID
    pub sessions: Arc<dyn auth::SessionStore>,

    /// OAuth identity provider
    pub provider: Arc<dyn auth::IdentityProvider>,

    /// Key for signing session cookies
    pub session_secret: Arc<str>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Build the HTTP client for the provider
    /// 2. Create the GitHub provider
    /// 3. Create the in-memory session store
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        if !config.should_use_secure_cookies() {
            tracing::warn!(
                domain = %config.server.domain,
                protocol = %config.server.protocol,
                "Using insecure session cookies for local development"
            );
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("gitgate/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let provider = auth::GitHubProvider::new(&config.auth.github, &config.server, http_client)?;
        tracing::info!(
            redirect_uri = %config.auth.github.redirect_uri(&config.server),
            scope = %config.auth.github.scope,
            "GitHub provider initialized"
        );

        let sessions = auth::MemorySessionStore::new(config.auth.session_max_age.unsigned_abs());

        Ok(Self::with_parts(config, Arc::new(sessions), Arc::new(provider)))
    }

    /// Assemble state from already-built parts
    ///
    /// Uses the configured session secret, or a random one when unset.
    pub fn with_parts(
        config: config::AppConfig,
        sessions: Arc<dyn auth::SessionStore>,
        provider: Arc<dyn auth::IdentityProvider>,
    ) -> Self {
        let session_secret = match &config.auth.session_secret {
            Some(secret) => secret.clone(),
            None => {
                tracing::info!("No session secret configured; generated a per-process secret");
                auth::session::random_token(32)
            }
        };

        Self {
            config: Arc::new(config),
            sessions,
            provider,
            session_secret: session_secret.into(),
        }
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware, routing::get};
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let protected_routes = Router::new()
        .route("/account", get(api::account))
        .merge(api::metrics_router::<AppState>())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(api::pages_router())
        .merge(auth::auth_router())
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
