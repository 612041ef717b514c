use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use cinelink_domain::user::UserRole;
use cinelink_session::identity::Identity;

use crate::domain::types::{ApiReport, BackendReport, ReviewWithLink, StorageStats};
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::handlers::auth::UserResponse;
use crate::handlers::links::RatedLinkResponse;
use crate::handlers::reviews::ReviewResponse;
use crate::state::AppState;
use crate::usecase::admin::{
    ApiStatusUseCase, BackendReportUseCase, DeleteUserUseCase, ListUsersUseCase, StatsUseCase,
    ToggleBackendUseCase, UpdateUserInput, UpdateUserUseCase,
};
use crate::usecase::link::{AdminDeleteLinkUseCase, PublicLinksUseCase};
use crate::usecase::review::{AdminDeleteReviewUseCase, ListAllReviewsUseCase};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub users: u64,
    pub links: u64,
    pub reviews: u64,
    pub favorites: u64,
}

impl From<StorageStats> for StatsResponse {
    fn from(stats: StorageStats) -> Self {
        StatsResponse {
            users: stats.users,
            links: stats.links,
            reviews: stats.reviews,
            favorites: stats.favorites,
        }
    }
}

#[derive(Serialize)]
pub struct BackendResponse {
    pub kind: String,
    pub status: String,
    pub location: String,
    pub collections: Vec<String>,
}

impl From<BackendReport> for BackendResponse {
    fn from(report: BackendReport) -> Self {
        BackendResponse {
            kind: report.kind,
            status: report.status,
            location: report.location,
            collections: report.collections,
        }
    }
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub backend: String,
    pub auto_restart: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiStatusResponse {
    pub name: String,
    pub description: String,
    pub status: String,
    pub status_code: Option<u16>,
    #[serde(serialize_with = "crate::handlers::to_rfc3339_ms")]
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl From<ApiReport> for ApiStatusResponse {
    fn from(report: ApiReport) -> Self {
        ApiStatusResponse {
            name: report.name,
            description: report.description,
            status: report.status.as_str().to_owned(),
            status_code: report.status_code,
            checked_at: report.checked_at,
        }
    }
}

/// Non-secret configuration view. Secrets and keys only show as booleans.
#[derive(Serialize)]
pub struct ConfigResponse {
    pub api_port: u16,
    pub backend: String,
    pub data_dir: String,
    pub database_configured: bool,
    pub omdb_key_configured: bool,
    pub youtube_key_configured: bool,
    pub supervised: bool,
}

#[derive(Serialize)]
pub struct ReviewWithLinkResponse {
    #[serde(flatten)]
    pub review: ReviewResponse,
    pub link_name: String,
    pub link_movie_id: String,
    pub link_is_public: bool,
    pub link_url: String,
}

impl From<ReviewWithLink> for ReviewWithLinkResponse {
    fn from(joined: ReviewWithLink) -> Self {
        ReviewWithLinkResponse {
            review: joined.review.into(),
            link_name: joined.link.name,
            link_movie_id: joined.link.movie_id,
            link_is_public: joined.link.is_public,
            link_url: joined.link.url,
        }
    }
}

// ── GET /admin/stats ─────────────────────────────────────────────────────────

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let usecase = StatsUseCase {
        users: state.users(),
        links: state.links(),
        reviews: state.reviews(),
        favorites: state.favorites(),
    };
    Ok(Json(usecase.execute().await?.into()))
}

// ── GET /admin/backend ───────────────────────────────────────────────────────

pub async fn backend(State(state): State<AppState>) -> Result<Json<BackendResponse>, ApiError> {
    let usecase = BackendReportUseCase {
        inspector: state.inspector.clone(),
    };
    Ok(Json(usecase.execute().await?.into()))
}

// ── POST /admin/backend/toggle ───────────────────────────────────────────────

pub async fn toggle_backend(
    State(state): State<AppState>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let usecase = ToggleBackendUseCase {
        flag: state.flag.clone(),
        supervised: state.config.supervised,
    };
    let outcome = usecase.execute(state.backend)?;
    let message = if outcome.auto_restart {
        // Give the response time to flush, then let the supervisor restart
        // us into the new backend.
        tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            tracing::info!("restarting to apply storage backend change");
            std::process::exit(0);
        });
        format!(
            "Storage backend switched to {}. Restarting...",
            outcome.new_backend.as_str()
        )
    } else {
        format!(
            "Storage backend switched to {}. Restart the service to apply.",
            outcome.new_backend.as_str()
        )
    };
    Ok(Json(ToggleResponse {
        backend: outcome.new_backend.as_str().to_owned(),
        auto_restart: outcome.auto_restart,
        message,
    }))
}

// ── GET /admin/apis ──────────────────────────────────────────────────────────

pub async fn api_status(State(state): State<AppState>) -> Json<Vec<ApiStatusResponse>> {
    let usecase = ApiStatusUseCase {
        movies: state.movies.clone(),
    };
    Json(usecase.execute().await.into_iter().map(Into::into).collect())
}

// ── GET /admin/config ────────────────────────────────────────────────────────

pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        api_port: state.config.api_port,
        backend: state.backend.as_str().to_owned(),
        data_dir: state.config.data_dir.display().to_string(),
        database_configured: state.config.database_url.is_some(),
        omdb_key_configured: state.config.omdb_api_key.is_some(),
        youtube_key_configured: state.config.youtube_api_key.is_some(),
        supervised: state.config.supervised,
    })
}

// ── GET /admin/users ─────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let usecase = ListUsersUseCase {
        repo: state.users(),
    };
    let users = usecase.execute().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// ── PATCH /admin/users/{id} ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub role: String,
}

pub async fn update_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role = UserRole::from_str_value(&body.role)
        .ok_or_else(|| ApiError::Validation("Role must be 'user' or 'admin'.".to_owned()))?;
    let usecase = UpdateUserUseCase {
        repo: state.users(),
    };
    let updated = usecase
        .execute(
            &identity.username,
            &user_id,
            UpdateUserInput {
                email: body.email,
                role,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

// ── DELETE /admin/users/{id} ─────────────────────────────────────────────────

pub async fn delete_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = DeleteUserUseCase {
        repo: state.users(),
    };
    usecase.execute(&identity.username, &user_id).await?;
    Ok(Json(MessageResponse::new(
        "User and all associated data deleted.",
    )))
}

// ── GET /admin/links ─────────────────────────────────────────────────────────

pub async fn list_links(
    State(state): State<AppState>,
) -> Result<Json<Vec<RatedLinkResponse>>, ApiError> {
    let usecase = PublicLinksUseCase {
        repo: state.links(),
    };
    let links = usecase.execute().await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}

// ── DELETE /admin/links/{id} ─────────────────────────────────────────────────

pub async fn delete_link(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = AdminDeleteLinkUseCase {
        repo: state.links(),
    };
    usecase.execute(&link_id).await?;
    Ok(Json(MessageResponse::new("Link and its reviews deleted.")))
}

// ── GET /admin/reviews ───────────────────────────────────────────────────────

pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewWithLinkResponse>>, ApiError> {
    let usecase = ListAllReviewsUseCase {
        repo: state.reviews(),
    };
    let reviews = usecase.execute().await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

// ── DELETE /admin/reviews/{id} ───────────────────────────────────────────────

pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = AdminDeleteReviewUseCase {
        repo: state.reviews(),
    };
    usecase.execute(&review_id).await?;
    Ok(Json(MessageResponse::new("Review deleted.")))
}
