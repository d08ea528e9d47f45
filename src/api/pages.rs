//! HTML pages
//!
//! - GET / - Home
//! - GET /login - Login page
//! - GET /account - Account details (behind the authentication gate)

use axum::{
    Router,
    response::{Html, IntoResponse},
    routing::get,
};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser, UserProfile};

/// Create public pages router
///
/// `/account` is mounted separately, behind `require_auth`.
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page))
}

/// GET /
pub async fn home(MaybeUser(session): MaybeUser) -> impl IntoResponse {
    let user = session.as_ref().map(|s| &s.profile);
    let body = match user {
        Some(profile) => format!(
            "<p>Hello, {}!</p>\n<p><a href=\"/account\">View your account</a></p>",
            encode_text(&profile.display_name)
        ),
        None => "<p>You are not signed in.</p>\n<p><a href=\"/login\">Sign in</a></p>".to_string(),
    };

    layout("Home", user, &body)
}

/// GET /login
///
/// Renders a simple login page with GitHub sign-in button.
pub async fn login_page(MaybeUser(session): MaybeUser) -> impl IntoResponse {
    let user = session.as_ref().map(|s| &s.profile);
    let body = match user {
        Some(profile) => format!(
            "<p>Signed in as {}.</p>\n<p><a href=\"/logout\">Sign out</a></p>",
            encode_text(&profile.login)
        ),
        None => "<p>Please sign in with GitHub</p>\n<a href=\"/auth/github\">Sign in with GitHub</a>"
            .to_string(),
    };

    layout("Login", user, &body)
}

/// GET /account
pub async fn account(CurrentUser(session): CurrentUser) -> impl IntoResponse {
    let profile = &session.profile;
    let mut body = String::from("<dl>\n");

    body.push_str(&format!(
        "<dt>Name</dt><dd>{}</dd>\n<dt>Username</dt><dd>{}</dd>\n<dt>ID</dt><dd>{}</dd>\n",
        encode_text(&profile.display_name),
        encode_text(&profile.login),
        profile.id
    ));
    if let Some(url) = &profile.profile_url {
        body.push_str(&format!(
            "<dt>Profile</dt><dd><a href=\"{}\">{}</a></dd>\n",
            encode_double_quoted_attribute(url.as_str()),
            encode_text(url.as_str())
        ));
    }
    body.push_str(&format!(
        "<dt>Signed in</dt><dd>{}</dd>\n</dl>",
        session.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    layout("Account", Some(profile), &body)
}

fn layout(title: &str, user: Option<&UserProfile>, body: &str) -> Html<String> {
    let nav = match user {
        Some(profile) => {
            let avatar = profile
                .avatar_url
                .as_ref()
                .map(|url| {
                    format!(
                        "<img src=\"{}\" alt=\"\" width=\"24\" height=\"24\"> ",
                        encode_double_quoted_attribute(url.as_str())
                    )
                })
                .unwrap_or_default();
            format!(
                "<a href=\"/\">Home</a> | <a href=\"/account\">{avatar}{}</a> | <a href=\"/logout\">Log out</a>",
                encode_text(&profile.login)
            )
        }
        None => "<a href=\"/\">Home</a> | <a href=\"/login\">Log in</a>".to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{title} - gitgate</title></head>
<body>
<nav>{nav}</nav>
<h1>{title}</h1>
{body}
</body>
</html>
"#
    ))
}
