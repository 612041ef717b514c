use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("user not found")]
    UserNotFound,
    #[error("Link not found or not authorized.")]
    LinkNotFound,
    #[error("review not found")]
    ReviewNotFound,
    #[error("movie not found")]
    MovieNotFound,
    #[error("Username already exists.")]
    UsernameTaken,
    #[error("Email already exists.")]
    EmailTaken,
    #[error("This email is already in use by another user.")]
    EmailInUse,
    #[error("You have already reviewed this link")]
    DuplicateReview,
    #[error("forbidden")]
    Forbidden,
    #[error("You cannot change your own user role.")]
    OwnRoleChange,
    #[error("You cannot delete your own account.")]
    OwnAccountDelete,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::LinkNotFound => "LINK_NOT_FOUND",
            Self::ReviewNotFound => "REVIEW_NOT_FOUND",
            Self::MovieNotFound => "MOVIE_NOT_FOUND",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::DuplicateReview => "DUPLICATE_REVIEW",
            Self::Forbidden => "FORBIDDEN",
            Self::OwnRoleChange => "OWN_ROLE_CHANGE",
            Self::OwnAccountDelete => "OWN_ACCOUNT_DELETE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UserNotFound
            | Self::LinkNotFound
            | Self::ReviewNotFound
            | Self::MovieNotFound => StatusCode::NOT_FOUND,
            Self::UsernameTaken
            | Self::EmailTaken
            | Self::EmailInUse
            | Self::DuplicateReview => StatusCode::CONFLICT,
            Self::Forbidden | Self::OwnRoleChange | Self::OwnAccountDelete => {
                StatusCode::FORBIDDEN
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    async fn assert_error(
        error: ApiError,
        expected_status: StatusCode,
        expected_kind: &str,
        expected_message: &str,
    ) {
        let resp = error.into_response();
        assert_eq!(resp.status(), expected_status);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["kind"], expected_kind);
        assert_eq!(json["message"], expected_message);
    }

    #[tokio::test]
    async fn should_return_validation_with_specific_message() {
        assert_error(
            ApiError::Validation("Invalid email format.".into()),
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Invalid email format.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_invalid_credentials() {
        assert_error(
            ApiError::InvalidCredentials,
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Invalid username or password.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_user_not_found() {
        assert_error(
            ApiError::UserNotFound,
            StatusCode::NOT_FOUND,
            "USER_NOT_FOUND",
            "user not found",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_link_not_found() {
        assert_error(
            ApiError::LinkNotFound,
            StatusCode::NOT_FOUND,
            "LINK_NOT_FOUND",
            "Link not found or not authorized.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_username_taken() {
        assert_error(
            ApiError::UsernameTaken,
            StatusCode::CONFLICT,
            "USERNAME_TAKEN",
            "Username already exists.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_duplicate_review() {
        assert_error(
            ApiError::DuplicateReview,
            StatusCode::CONFLICT,
            "DUPLICATE_REVIEW",
            "You have already reviewed this link",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_own_role_change() {
        assert_error(
            ApiError::OwnRoleChange,
            StatusCode::FORBIDDEN,
            "OWN_ROLE_CHANGE",
            "You cannot change your own user role.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_own_account_delete() {
        assert_error(
            ApiError::OwnAccountDelete,
            StatusCode::FORBIDDEN,
            "OWN_ACCOUNT_DELETE",
            "You cannot delete your own account.",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_internal_with_generic_message() {
        assert_error(
            ApiError::Internal(anyhow::anyhow!("db exploded")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "internal error",
        )
        .await;
    }
}
