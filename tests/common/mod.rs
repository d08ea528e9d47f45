//! Common test utilities for E2E tests

#![allow(dead_code)]

use axum::{
    Form, Json, Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use gitgate::{AppState, build_router, config};
use serde::Deserialize;
use tokio::net::TcpListener;

/// Authorization code the fake GitHub accepts
pub const GOOD_CODE: &str = "good-code";
/// Authorization code that yields a profile with an empty login
pub const BROKEN_PROFILE_CODE: &str = "broken-profile";

const ACCESS_TOKEN: &str = "gho_test_access_token";
const BROKEN_ACCESS_TOKEN: &str = "gho_broken_profile";

static METRICS: std::sync::Once = std::sync::Once::new();

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the app against an in-process fake GitHub
    pub async fn new() -> Self {
        let github_addr = spawn(fake_github_router()).await;

        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                domain: "localhost:3000".to_string(),
                protocol: "http".to_string(),
            },
            auth: config::AuthConfig {
                session_secret: Some("test-secret-key-32-bytes-long!!!".to_string()),
                session_max_age: 604800,
                github: config::GitHubOAuthConfig {
                    client_id: "test-client-id".to_string(),
                    client_secret: "test-client-secret".to_string(),
                    scope: "user".to_string(),
                    authorize_url: format!("{github_addr}/login/oauth/authorize"),
                    token_url: format!("{github_addr}/login/oauth/access_token"),
                    api_url: format!("{github_addr}/api"),
                    callback_url: None,
                },
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        METRICS.call_once(gitgate::metrics::init_metrics);

        let state = AppState::new(config).expect("app state initializes");
        let addr = spawn(build_router(state.clone())).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build no-redirect client");

        Self {
            addr,
            state,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET `path`, optionally presenting a session cookie value
    pub async fn get(&self, path: &str, session: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(session) = session {
            request = request.header("Cookie", format!("session={session}"));
        }
        request.send().await.expect("request succeeds")
    }

    /// Run the full OAuth flow and return the session cookie value
    pub async fn sign_in(&self) -> String {
        let (state, state_cookie) = self.begin_login().await;

        let response = self
            .client
            .get(self.url(&format!(
                "/auth/github/callback?code={GOOD_CODE}&state={state}"
            )))
            .header("Cookie", format!("oauth_state={state_cookie}"))
            .send()
            .await
            .expect("callback request succeeds");

        assert_eq!(location(&response), "/");
        cookie_value(&response, "session").expect("session cookie is set")
    }

    /// Hit /auth/github; returns the `state` query parameter and the state cookie
    pub async fn begin_login(&self) -> (String, String) {
        let response = self
            .client
            .get(self.url("/auth/github"))
            .send()
            .await
            .expect("request succeeds");

        assert!(response.status().is_redirection());
        let location = url::Url::parse(&location(&response)).expect("absolute redirect");
        let state = location
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter");
        let cookie = cookie_value(&response, "oauth_state").expect("state cookie");

        (state, cookie)
    }
}

/// Location header of a redirect response
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Value of a cookie set by the response, if any
pub fn cookie_value(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix(&prefix))
        .filter_map(|v| v.split(';').next())
        .find(|v| !v.is_empty())
        .map(ToString::to_string)
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

// =============================================================================
// Fake GitHub
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenForm {
    client_id: String,
    client_secret: String,
    code: String,
}

fn fake_github_router() -> Router {
    Router::new()
        .route("/login/oauth/access_token", post(fake_token))
        .route("/api/user", get(fake_user))
}

async fn fake_token(Form(form): Form<TokenForm>) -> impl IntoResponse {
    if form.client_id != "test-client-id" || form.client_secret != "test-client-secret" {
        return Json(serde_json::json!({ "error": "incorrect_client_credentials" }));
    }

    let token = match form.code.as_str() {
        GOOD_CODE => ACCESS_TOKEN,
        BROKEN_PROFILE_CODE => BROKEN_ACCESS_TOKEN,
        _ => {
            return Json(serde_json::json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            }));
        }
    };

    Json(serde_json::json!({
        "access_token": token,
        "token_type": "bearer",
        "scope": "user"
    }))
}

async fn fake_user(headers: HeaderMap) -> axum::response::Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match auth.strip_prefix("Bearer ") {
        Some(ACCESS_TOKEN) => Json(serde_json::json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
            "html_url": "https://github.com/octocat"
        }))
        .into_response(),
        Some(BROKEN_ACCESS_TOKEN) => Json(serde_json::json!({
            "login": "",
            "id": 1,
            "name": null
        }))
        .into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}
