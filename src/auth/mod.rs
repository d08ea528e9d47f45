//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - Session management
//! - Authentication gate

mod middleware;
mod oauth;
pub mod profile;
pub mod provider;
pub mod session;
pub mod store;

pub use middleware::{CurrentUser, LOGIN_PATH, LoginRedirect, MaybeUser, authenticate, require_auth};
pub use oauth::{STATE_COOKIE, auth_router};
pub use profile::UserProfile;
pub use provider::{GitHubProvider, IdentityProvider};
pub use session::{SESSION_COOKIE, Session, sign_session_id, verify_session_cookie};
pub use store::{MemorySessionStore, SessionStore};
