//! User profile returned by the identity provider
//!
//! The raw provider payload is validated into [`UserProfile`] before it
//! reaches a session. Nothing downstream interprets provider JSON.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;

/// Authenticated user, as held in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Provider user ID
    pub id: u64,
    /// Provider username
    pub login: String,
    /// Display name, falls back to `login`
    pub display_name: String,
    pub avatar_url: Option<Url>,
    /// Public profile page
    pub profile_url: Option<Url>,
}

/// GitHub `GET /user` response (subset)
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubUser {
    pub login: String,
    pub id: u64,
    pub avatar_url: Option<String>,
    pub name: Option<String>,
    pub html_url: Option<String>,
}

impl TryFrom<GitHubUser> for UserProfile {
    type Error = AppError;

    fn try_from(user: GitHubUser) -> Result<Self, Self::Error> {
        let login = user.login.trim().to_string();
        if login.is_empty() {
            return Err(AppError::Provider("profile has an empty login".to_string()));
        }
        if user.id == 0 {
            return Err(AppError::Provider("profile has no user id".to_string()));
        }

        let display_name = user
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| login.clone());

        Ok(Self {
            id: user.id,
            avatar_url: web_url(user.avatar_url.as_deref()),
            profile_url: web_url(user.html_url.as_deref()),
            login,
            display_name,
        })
    }
}

/// Parse an optional link, keeping only http(s) URLs
fn web_url(raw: Option<&str>) -> Option<Url> {
    let url = Url::parse(raw?).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
