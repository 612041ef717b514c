//! Session middleware.
//!
//! `require_session` does a per-request refresh: the token only proves who
//! logged in, the backing user record is re-loaded on every request so a
//! deleted account is locked out immediately and role changes take effect
//! without re-login.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use cinelink_session::cookie::{CINELINK_SESSION, clear_session_cookie};
use cinelink_session::identity::Identity;
use cinelink_session::token::validate_session_token;

use crate::domain::repository::UserRepository;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(cookie) = jar.get(CINELINK_SESSION) else {
        return ApiError::Unauthorized.into_response();
    };
    let Ok(claims) = validate_session_token(cookie.value(), &state.config.session_secret) else {
        return (clear_session_cookie(jar), ApiError::Unauthorized).into_response();
    };
    let user = match state.stores.users.find_by_username(&claims.sub).await {
        Ok(Some(user)) => user,
        // User deleted since the token was issued: the session dies with it.
        Ok(None) => return (clear_session_cookie(jar), ApiError::Unauthorized).into_response(),
        Err(e) => return e.into_response(),
    };
    request.extensions_mut().insert(Identity {
        username: user.username,
        role: user.role,
    });
    next.run(request).await
}

/// Layered inside `require_session`; expects the stamped [`Identity`].
pub async fn require_admin(request: Request, next: Next) -> Response {
    match request.extensions().get::<Identity>() {
        Some(identity) if identity.is_admin() => next.run(request).await,
        Some(_) => ApiError::Forbidden.into_response(),
        None => ApiError::Unauthorized.into_response(),
    }
}
