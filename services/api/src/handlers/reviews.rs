use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use cinelink_session::identity::Identity;

use crate::domain::types::Review;
use crate::error::ApiError;
use crate::handlers::MessageResponse;
use crate::state::AppState;
use crate::usecase::review::{
    AddReviewInput, AddReviewUseCase, DeleteReviewUseCase, GetLinkReviewsUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: String,
    pub link_id: String,
    pub username: String,
    pub rating: u8,
    pub comment: Option<String>,
    #[serde(serialize_with = "crate::handlers::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        ReviewResponse {
            id: review.id,
            link_id: review.link_id,
            username: review.username,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

// ── POST /reviews ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddReviewRequest {
    pub link_id: String,
    /// Wide integer on the wire so out-of-range values reach the rating
    /// validation instead of a deserialization failure.
    pub rating: i64,
    pub comment: Option<String>,
}

pub async fn add_review(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<AddReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let rating = u8::try_from(body.rating)
        .map_err(|_| ApiError::Validation("Rating must be between 1 and 5.".to_owned()))?;
    let usecase = AddReviewUseCase {
        links: state.links(),
        reviews: state.reviews(),
    };
    let review = usecase
        .execute(
            &identity.username,
            AddReviewInput {
                link_id: body.link_id,
                rating,
                comment: body.comment,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

// ── GET /reviews/{link_id} ───────────────────────────────────────────────────

pub async fn get_link_reviews(
    _identity: Identity,
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let usecase = GetLinkReviewsUseCase {
        links: state.links(),
        reviews: state.reviews(),
    };
    let reviews = usecase.execute(&link_id).await?;
    Ok(Json(reviews.into_iter().map(Into::into).collect()))
}

// ── DELETE /reviews/{review_id} ──────────────────────────────────────────────

pub async fn delete_review(
    identity: Identity,
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let usecase = DeleteReviewUseCase {
        repo: state.reviews(),
    };
    usecase.execute(&review_id, &identity.username).await?;
    Ok(Json(MessageResponse::new("Review deleted.")))
}
