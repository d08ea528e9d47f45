//! Authentication gate
//!
//! Protects routes that require a signed-in user. Every failure sends the
//! browser to the login page.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, Session, verify_session_cookie};
use crate::AppState;

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/login";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

/// Resolve the session a request carries, if any
///
/// The token must carry a valid signature and name a live session in
/// the store.
pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> Option<Session> {
    let token = extract_token_from_headers(headers)?;
    let session_id = verify_session_cookie(&token, &state.session_secret).ok()?;
    state.sessions.get(&session_id).await
}

/// Middleware to require authentication
///
/// Adds Session to request extensions if valid, otherwise redirects
/// to the login page.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/account", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = authenticate(request.headers(), &state).await else {
        tracing::debug!(path = %request.uri().path(), "Unauthenticated request redirected");
        return Redirect::to(LOGIN_PATH).into_response();
    };

    request.extensions_mut().insert(session);

    next.run(request).await
}

/// Rejection for [`CurrentUser`]: redirect to the login page
#[derive(Debug)]
pub struct LoginRedirect;

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Extractor for current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(session): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", session.profile.login)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(CurrentUser(session));
        }

        let state = AppState::from_ref(state);
        let session = authenticate(&parts.headers, &state)
            .await
            .ok_or(LoginRedirect)?;
        parts.extensions.insert(session.clone());

        Ok(CurrentUser(session))
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of redirecting.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(MaybeUser(Some(session)));
        }

        let app_state = AppState::from_ref(state);
        let session = authenticate(&parts.headers, &app_state).await;

        if let Some(session) = &session {
            parts.extensions.insert(session.clone());
        }

        Ok(MaybeUser(session))
    }
}
