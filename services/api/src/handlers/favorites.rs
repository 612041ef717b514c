use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use cinelink_session::identity::Identity;

use crate::domain::types::Favorite;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::favorite::{
    AddFavoriteUseCase, ContainsFavoriteUseCase, ListFavoritesUseCase, RemoveFavoriteUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FavoriteResponse {
    pub movie_id: String,
    #[serde(serialize_with = "crate::handlers::to_rfc3339_ms")]
    pub added_date: chrono::DateTime<chrono::Utc>,
}

impl From<Favorite> for FavoriteResponse {
    fn from(favorite: Favorite) -> Self {
        FavoriteResponse {
            movie_id: favorite.movie_id,
            added_date: favorite.added_date,
        }
    }
}

#[derive(Serialize)]
pub struct ContainsResponse {
    pub movie_id: String,
    pub favorite: bool,
}

// ── GET /favorites ───────────────────────────────────────────────────────────

pub async fn list_favorites(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<FavoriteResponse>>, ApiError> {
    let usecase = ListFavoritesUseCase {
        repo: state.favorites(),
    };
    let favorites = usecase.execute(&identity.username).await?;
    Ok(Json(favorites.into_iter().map(Into::into).collect()))
}

// ── POST /favorites ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddFavoriteRequest {
    pub movie_id: String,
}

pub async fn add_favorite(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<AddFavoriteRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = AddFavoriteUseCase {
        repo: state.favorites(),
    };
    usecase.execute(&identity.username, &body.movie_id).await?;
    Ok(Json(MessageResponse::new("Added to favorites.")))
}

// ── DELETE /favorites/{movie_id} ─────────────────────────────────────────────

pub async fn remove_favorite(
    identity: Identity,
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = RemoveFavoriteUseCase {
        repo: state.favorites(),
    };
    usecase.execute(&identity.username, &movie_id).await?;
    Ok(Json(MessageResponse::new("Removed from favorites.")))
}

// ── GET /favorites/{movie_id} ────────────────────────────────────────────────

pub async fn contains_favorite(
    identity: Identity,
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<ContainsResponse>, ApiError> {
    let usecase = ContainsFavoriteUseCase {
        repo: state.favorites(),
    };
    let favorite = usecase.execute(&identity.username, &movie_id).await?;
    Ok(Json(ContainsResponse { movie_id, favorite }))
}
