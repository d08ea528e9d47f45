//! Session management
//!
//! Sessions live in the server-side [`SessionStore`](super::SessionStore).
//! The browser only holds an opaque, HMAC-signed session ID in a cookie.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::profile::UserProfile;
use crate::error::AppError;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

const SESSION_ID_BYTES: usize = 32;

/// User session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session ID (URL-safe base64)
    pub id: String,
    /// The signed-in user
    pub profile: UserProfile,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a new session for `profile` lasting `max_age_secs`
    ///
    /// Ages beyond what `DateTime` can represent saturate.
    pub fn new(profile: UserProfile, max_age_secs: i64) -> Self {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(max_age_secs)
            .and_then(|age| now.checked_add_signed(age))
            .unwrap_or(if max_age_secs < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            });

        Self {
            id: random_token(SESSION_ID_BYTES),
            profile,
            created_at: now,
            expires_at,
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Random URL-safe token of `len` bytes of entropy
pub fn random_token(len: usize) -> String {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Sign a session ID for the session cookie
///
/// Cookie format: session_id.base64(hmac_sha256(session_id))
pub fn sign_session_id(session_id: &str, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(session_id.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", session_id, signature_b64))
}

/// Verify a signed session cookie value
///
/// # Returns
/// The session ID if the signature matches
///
/// # Errors
/// Returns `Unauthorized` if the value is malformed or the signature is wrong
pub fn verify_session_cookie(value: &str, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let (session_id, signature_b64) = value.split_once('.').ok_or(AppError::Unauthorized)?;
    if session_id.is_empty() || signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(session_id.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    Ok(session_id.to_string())
}
