use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use cinelink_session::identity::Identity;

use crate::domain::types::{Link, RatedLink};
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::link::{
    DeleteLinkUseCase, GetLinkUseCase, GetMovieLinksUseCase, TopLinksUseCase, UpsertLinkInput,
    UpsertLinkUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub username: String,
    pub movie_id: String,
    pub is_public: bool,
    #[serde(serialize_with = "crate::handlers::to_rfc3339_ms")]
    pub added_date: chrono::DateTime<chrono::Utc>,
}

impl From<Link> for LinkResponse {
    fn from(link: Link) -> Self {
        LinkResponse {
            id: link.id,
            name: link.name,
            description: link.description,
            url: link.url,
            username: link.username,
            movie_id: link.movie_id,
            is_public: link.is_public,
            added_date: link.added_date,
        }
    }
}

/// `avg_rating` is serialized even when `None`: an explicit `null` tells the
/// client "unrated", which is not the same as a zero average.
#[derive(Serialize)]
pub struct RatedLinkResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub avg_rating: Option<f64>,
}

impl From<RatedLink> for RatedLinkResponse {
    fn from(rated: RatedLink) -> Self {
        RatedLinkResponse {
            link: rated.link.into(),
            avg_rating: rated.avg_rating,
        }
    }
}

// ── GET /links/{movie_id} ────────────────────────────────────────────────────

pub async fn get_movie_links(
    identity: Identity,
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
) -> Result<Json<Vec<RatedLinkResponse>>, ApiError> {
    let usecase = GetMovieLinksUseCase {
        repo: state.links(),
    };
    let links = usecase.execute(&movie_id, &identity.username).await?;
    Ok(Json(links.into_iter().map(Into::into).collect()))
}

// ── PUT /links/{movie_id} ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpsertLinkRequest {
    pub link_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn upsert_link(
    identity: Identity,
    State(state): State<AppState>,
    Path(movie_id): Path<String>,
    Json(body): Json<UpsertLinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    let usecase = UpsertLinkUseCase {
        repo: state.links(),
    };
    let link = usecase
        .execute(
            &identity.username,
            &movie_id,
            UpsertLinkInput {
                link_id: body.link_id,
                name: body.name,
                description: body.description,
                url: body.url,
                is_public: body.is_public,
            },
        )
        .await?;
    Ok(Json(link.into()))
}

// ── DELETE /links/{link_id} ──────────────────────────────────────────────────

pub async fn delete_link(
    identity: Identity,
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = DeleteLinkUseCase {
        repo: state.links(),
    };
    usecase.execute(&link_id, &identity.username).await?;
    Ok(Json(MessageResponse::new("Link deleted.")))
}

// ── GET /links/by-id/{link_id} ───────────────────────────────────────────────

pub async fn get_link(
    identity: Identity,
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<RatedLinkResponse>, ApiError> {
    let usecase = GetLinkUseCase {
        links: state.links(),
        reviews: state.reviews(),
    };
    let rated = usecase.execute(&link_id, &identity.username).await?;
    Ok(Json(rated.into()))
}

// ── GET /top-links ───────────────────────────────────────────────────────────

pub async fn top_links(
    _identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<Vec<RatedLinkResponse>>, ApiError> {
    let usecase = TopLinksUseCase {
        repo: state.links(),
    };
    let top = usecase.execute().await?;
    Ok(Json(top.into_iter().map(Into::into).collect()))
}
