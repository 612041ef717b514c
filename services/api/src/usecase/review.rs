//! Review use cases.

use crate::domain::repository::{LinkRepository, ReviewRepository};
use crate::domain::types::{NewReview, Review, ReviewWithLink};
use crate::error::ApiError;

// ── AddReview ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AddReviewInput {
    pub link_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

pub struct AddReviewUseCase<L: LinkRepository, R: ReviewRepository> {
    pub links: L,
    pub reviews: R,
}

impl<L: LinkRepository, R: ReviewRepository> AddReviewUseCase<L, R> {
    pub async fn execute(&self, username: &str, input: AddReviewInput) -> Result<Review, ApiError> {
        if self.links.find_by_id(&input.link_id).await?.is_none() {
            return Err(ApiError::LinkNotFound);
        }
        if !(1..=5).contains(&input.rating) {
            return Err(ApiError::Validation(
                "Rating must be between 1 and 5.".to_owned(),
            ));
        }
        if self.reviews.exists_for(&input.link_id, username).await? {
            return Err(ApiError::DuplicateReview);
        }
        self.reviews
            .create(NewReview {
                link_id: input.link_id,
                username: username.to_owned(),
                rating: input.rating,
                comment: input.comment.filter(|c| !c.trim().is_empty()),
            })
            .await
    }
}

// ── GetLinkReviews ───────────────────────────────────────────────────────────

pub struct GetLinkReviewsUseCase<L: LinkRepository, R: ReviewRepository> {
    pub links: L,
    pub reviews: R,
}

impl<L: LinkRepository, R: ReviewRepository> GetLinkReviewsUseCase<L, R> {
    pub async fn execute(&self, link_id: &str) -> Result<Vec<Review>, ApiError> {
        if self.links.find_by_id(link_id).await?.is_none() {
            return Err(ApiError::LinkNotFound);
        }
        self.reviews.list_for_link(link_id).await
    }
}

// ── ListAllReviews (admin) ───────────────────────────────────────────────────

pub struct ListAllReviewsUseCase<R: ReviewRepository> {
    pub repo: R,
}

impl<R: ReviewRepository> ListAllReviewsUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<ReviewWithLink>, ApiError> {
        self.repo.list_with_links().await
    }
}

// ── DeleteReview (author-only) ───────────────────────────────────────────────

pub struct DeleteReviewUseCase<R: ReviewRepository> {
    pub repo: R,
}

impl<R: ReviewRepository> DeleteReviewUseCase<R> {
    pub async fn execute(&self, id: &str, username: &str) -> Result<(), ApiError> {
        let Some(review) = self.repo.find_by_id(id).await? else {
            return Err(ApiError::ReviewNotFound);
        };
        if review.username != username {
            return Err(ApiError::Forbidden);
        }
        self.repo.delete(id).await?;
        Ok(())
    }
}

// ── AdminDeleteReview ────────────────────────────────────────────────────────

pub struct AdminDeleteReviewUseCase<R: ReviewRepository> {
    pub repo: R,
}

impl<R: ReviewRepository> AdminDeleteReviewUseCase<R> {
    pub async fn execute(&self, id: &str) -> Result<(), ApiError> {
        if !self.repo.delete(id).await? {
            return Err(ApiError::ReviewNotFound);
        }
        Ok(())
    }
}
