use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde::{Deserialize, Serialize};

use cinelink_domain::movie::MovieSummary;
use cinelink_session::identity::Identity;

use crate::domain::repository::MovieCatalogPort;
use crate::error::ApiError;
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MovieResponse {
    pub imdb_id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub rating: Option<String>,
}

impl From<MovieSummary> for MovieResponse {
    fn from(movie: MovieSummary) -> Self {
        MovieResponse {
            imdb_id: movie.imdb_id,
            title: movie.title,
            year: movie.year,
            poster: movie.poster,
            plot: movie.plot,
            rating: movie.rating,
        }
    }
}

#[derive(Serialize)]
pub struct TrailerResponse {
    pub imdb_id: String,
    pub trailer_url: Option<String>,
}

// ── GET /movies/search?query= ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    pub query: Option<String>,
}

pub async fn search_movies(
    _identity: Identity,
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<MovieResponse>>, ApiError> {
    let query: SearchQuery = raw_query
        .as_deref()
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| ApiError::Validation("Invalid search query.".to_owned()))?
        .unwrap_or_default();
    let query = query
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Search query is required.".to_owned()))?;
    let movies = state.movies.search(&query).await?;
    Ok(Json(movies.into_iter().map(Into::into).collect()))
}

// ── GET /movies/{imdb_id} ────────────────────────────────────────────────────

pub async fn get_movie(
    _identity: Identity,
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<Json<MovieResponse>, ApiError> {
    let movie = state
        .movies
        .lookup(&imdb_id)
        .await?
        .ok_or(ApiError::MovieNotFound)?;
    Ok(Json(movie.into()))
}

// ── GET /movies/{imdb_id}/trailer ────────────────────────────────────────────

pub async fn get_trailer(
    _identity: Identity,
    State(state): State<AppState>,
    Path(imdb_id): Path<String>,
) -> Result<Json<TrailerResponse>, ApiError> {
    let movie = state
        .movies
        .lookup(&imdb_id)
        .await?
        .ok_or(ApiError::MovieNotFound)?;
    // Best effort: a movie without a findable trailer is not an error.
    let trailer_url = state.movies.trailer(&movie.title).await?;
    Ok(Json(TrailerResponse {
        imdb_id,
        trailer_url,
    }))
}
