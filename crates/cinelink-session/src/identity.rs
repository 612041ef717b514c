//! Authenticated-identity request extension and extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;

use cinelink_domain::user::UserRole;

/// The authenticated user for the current request.
///
/// Inserted into request extensions by the session middleware AFTER the
/// backing user record has been re-loaded from storage, so `role` is always
/// current even if it changed since the token was issued.
///
/// Returns 401 when extracted from a request the middleware did not stamp.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub role: UserRole,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<Identity>().cloned();
        async move { identity.ok_or(StatusCode::UNAUTHORIZED) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use http::Request;

    #[tokio::test]
    async fn should_extract_identity_from_extensions() {
        let request = Request::builder().method("GET").uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();
        parts.extensions.insert(Identity {
            username: "alice".to_owned(),
            role: UserRole::Admin,
        });

        let identity = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(identity.username, "alice");
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn should_reject_request_without_identity() {
        let request = Request::builder().method("GET").uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = Identity::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.unwrap_err(), StatusCode::UNAUTHORIZED);
    }
}
