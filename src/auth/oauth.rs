//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub,
//! plus logout.

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use super::middleware::LOGIN_PATH;
use super::session::{SESSION_COOKIE, Session, random_token, sign_session_id, verify_session_cookie};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{LOGINS_TOTAL, LOGOUTS_TOTAL};

/// Name of the CSRF state cookie
pub const STATE_COOKIE: &str = "oauth_state";

const STATE_COOKIE_MAX_AGE_SECS: i64 = 600;
const STATE_BYTES: usize = 24;

/// Create authentication router
///
/// Routes:
/// - GET /auth/github - Redirect to GitHub
/// - GET /auth/github/callback - OAuth callback
/// - GET, POST /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/github", get(github_redirect))
        .route("/auth/github/callback", get(github_callback))
        .route("/logout", get(logout).post(logout))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /auth/github
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store the signed state in a cookie
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
async fn github_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let csrf_state = generate_csrf_state();
    let url = state.provider.authorization_url(&csrf_state);
    let signed_state = sign_session_id(&csrf_state, &state.session_secret)?;

    let cookie = Cookie::build((STATE_COOKIE, signed_state))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE_SECS));

    Ok((jar.add(cookie), Redirect::to(url.as_str())))
}

/// Query parameters from GitHub callback
///
/// Everything is optional: a denied authorization comes back with
/// `error` instead of `code`.
#[derive(Debug, Default, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Provider error, e.g. "access_denied"
    error: Option<String>,
}

/// GET /auth/github/callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for the user's profile
/// 3. Create session and set cookie
/// 4. Redirect to home
///
/// Any failure, including a query that does not parse, redirects to the
/// login page.
async fn github_callback(
    State(state): State<AppState>,
    query: Result<Query<GitHubCallbackQuery>, QueryRejection>,
    jar: CookieJar,
) -> impl IntoResponse {
    let outcome = match query {
        Ok(Query(query)) => complete_login(&state, &query, &jar).await,
        Err(rejection) => Err(AppError::Validation(format!(
            "malformed callback query: {}",
            rejection.body_text()
        ))),
    };
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));

    match outcome {
        Ok((session, cookie_value)) => {
            LOGINS_TOTAL.with_label_values(&["success"]).inc();
            tracing::info!(
                login = %session.profile.login,
                github_id = session.profile.id,
                "User signed in"
            );
            (jar.add(session_cookie(&state, cookie_value)), Redirect::to("/"))
        }
        Err(error) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            tracing::warn!(%error, "GitHub sign-in failed");
            (jar, Redirect::to(LOGIN_PATH))
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: &GitHubCallbackQuery,
    jar: &CookieJar,
) -> Result<(Session, String), AppError> {
    if let Some(error) = &query.error {
        return Err(AppError::Provider(format!("authorization refused: {error}")));
    }

    let returned_state = query
        .state
        .as_deref()
        .ok_or_else(|| AppError::Validation("missing state parameter".to_string()))?;
    verify_csrf_state(returned_state, jar, &state.session_secret)?;

    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("missing code parameter".to_string()))?;

    let profile = state.provider.complete(code).await?;

    // Drop any session the browser presented before signing in again
    if let Some(previous) = jar.get(SESSION_COOKIE) {
        if let Ok(previous_id) = verify_session_cookie(previous.value(), &state.session_secret) {
            state.sessions.remove(&previous_id).await;
        }
    }

    let session = Session::new(profile, state.config.auth.session_max_age);
    let cookie_value = sign_session_id(&session.id, &state.session_secret)?;
    state.sessions.insert(session.clone()).await;

    Ok((session, cookie_value))
}

// =============================================================================
// Logout
// =============================================================================

/// GET /logout, POST /logout
///
/// Invalidates the server-side session, clears the cookie and
/// redirects home.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let session_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| verify_session_cookie(cookie.value(), &state.session_secret).ok());

    if let Some(session_id) = session_id {
        if let Some(session) = state.sessions.remove(&session_id).await {
            tracing::info!(login = %session.profile.login, "User signed out");
        }
    }

    LOGOUTS_TOTAL.inc();

    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}

// =============================================================================
// Helpers
// =============================================================================

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.should_use_secure_cookies())
        .max_age(time::Duration::seconds(state.config.auth.session_max_age))
        .build()
}

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    random_token(STATE_BYTES)
}

/// Verify the callback state against the signed state cookie
///
/// The cookie's signature must be a valid HMAC of the returned state.
fn verify_csrf_state(returned: &str, jar: &CookieJar, secret: &str) -> Result<(), AppError> {
    let cookie = jar
        .get(STATE_COOKIE)
        .ok_or_else(|| AppError::Validation("missing state cookie".to_string()))?;
    let (_, signature) = cookie
        .value()
        .split_once('.')
        .ok_or_else(|| AppError::Validation("malformed state cookie".to_string()))?;

    verify_session_cookie(&format!("{returned}.{signature}"), secret)
        .map_err(|_| AppError::Validation("state mismatch".to_string()))?;

    Ok(())
}
