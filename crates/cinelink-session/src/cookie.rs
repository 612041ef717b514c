//! Session cookie builders.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the session token.
pub const CINELINK_SESSION: &str = "cinelink_session";

/// Session lifetime in seconds (24 hours, matching the legacy session cookie).
pub const SESSION_TTL_SECS: u64 = 86400;

/// Set the session cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use cinelink_session::cookie::{set_session_cookie, CINELINK_SESSION};
///
/// let jar = set_session_cookie(CookieJar::new(), "token_value".to_string());
/// let cookie = jar.get(CINELINK_SESSION).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(86400)));
/// assert!(cookie.http_only().unwrap_or(false));
/// ```
pub fn set_session_cookie(jar: CookieJar, value: String) -> CookieJar {
    let cookie = Cookie::build((CINELINK_SESSION, value))
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL_SECS as i64))
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

/// Clear the session cookie by setting Max-Age to 0.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use cinelink_session::cookie::{clear_session_cookie, set_session_cookie, CINELINK_SESSION};
///
/// let jar = set_session_cookie(CookieJar::new(), "t".to_string());
/// let jar = clear_session_cookie(jar);
/// let cookie = jar.get(CINELINK_SESSION).unwrap();
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let cookie = Cookie::build((CINELINK_SESSION, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}
