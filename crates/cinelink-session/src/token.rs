use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use cinelink_domain::user::UserRole;

use crate::cookie::SESSION_TTL_SECS;

/// Errors from issuing or validating a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("invalid session token")]
    Invalid,
    #[error("failed to sign session token")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by the session token.
///
/// `sub` is the username; the role is a snapshot at login time and is
/// re-verified against storage on every request by the session middleware.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub role: UserRole,
    pub exp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

/// Sign a session token for `username`, valid for [`SESSION_TTL_SECS`].
pub fn issue_session_token(
    username: &str,
    role: UserRole,
    secret: &str,
) -> Result<String, SessionTokenError> {
    let claims = SessionClaims {
        sub: username.to_owned(),
        role,
        exp: now_secs() + SESSION_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(SessionTokenError::Sign)
}

/// Validate a session token and return its claims.
pub fn validate_session_token(
    token: &str,
    secret: &str,
) -> Result<SessionClaims, SessionTokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| SessionTokenError::Invalid)?;

    Ok(data.claims)
}
