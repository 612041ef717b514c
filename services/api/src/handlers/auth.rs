use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use cinelink_session::cookie::{clear_session_cookie, set_session_cookie};
use cinelink_session::identity::Identity;
use cinelink_session::token::issue_session_token;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::auth::{LoginUseCase, RegisterInput, RegisterUseCase};

// ── Response types ───────────────────────────────────────────────────────────

/// Public view of a user; the password hash never leaves the service.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(serialize_with = "crate::handlers::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.as_str().to_owned(),
            created_at: user.created_at,
        }
    }
}

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserResponse>), ApiError> {
    let usecase = RegisterUseCase {
        repo: state.users(),
    };
    let user = usecase
        .execute(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
            confirm_password: body.confirm_password,
        })
        .await?;
    let token = issue_session_token(&user.username, user.role, &state.config.session_secret)
        .map_err(anyhow::Error::new)?;
    Ok((
        StatusCode::CREATED,
        set_session_cookie(jar, token),
        Json(user.into()),
    ))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserResponse>), ApiError> {
    let usecase = LoginUseCase {
        repo: state.users(),
    };
    let user = usecase.execute(&body.username, &body.password).await?;
    let token = issue_session_token(&user.username, user.role, &state.config.session_secret)
        .map_err(anyhow::Error::new)?;
    Ok((set_session_cookie(jar, token), Json(user.into())))
}

// ── POST /auth/logout ────────────────────────────────────────────────────────

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(jar),
        Json(MessageResponse::new("Logged out.")),
    )
}

// ── GET /auth/me ─────────────────────────────────────────────────────────────

pub async fn me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users()
        .find_by_username(&identity.username)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(user.into()))
}
