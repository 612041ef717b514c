//! Favorite use cases. All of them are thin: the interesting semantics
//! (idempotent add, no-op remove) live in the repository contract.

use crate::domain::repository::FavoriteRepository;
use crate::domain::types::Favorite;
use crate::error::ApiError;

pub struct ListFavoritesUseCase<R: FavoriteRepository> {
    pub repo: R,
}

impl<R: FavoriteRepository> ListFavoritesUseCase<R> {
    pub async fn execute(&self, username: &str) -> Result<Vec<Favorite>, ApiError> {
        self.repo.list(username).await
    }
}

pub struct AddFavoriteUseCase<R: FavoriteRepository> {
    pub repo: R,
}

impl<R: FavoriteRepository> AddFavoriteUseCase<R> {
    /// Favoriting twice succeeds without a second entry.
    pub async fn execute(&self, username: &str, movie_id: &str) -> Result<(), ApiError> {
        if movie_id.trim().is_empty() {
            return Err(ApiError::Validation("Movie id is required.".to_owned()));
        }
        self.repo.add(username, movie_id).await?;
        Ok(())
    }
}

pub struct RemoveFavoriteUseCase<R: FavoriteRepository> {
    pub repo: R,
}

impl<R: FavoriteRepository> RemoveFavoriteUseCase<R> {
    /// Removing an absent favorite also succeeds.
    pub async fn execute(&self, username: &str, movie_id: &str) -> Result<(), ApiError> {
        self.repo.remove(username, movie_id).await?;
        Ok(())
    }
}

pub struct ContainsFavoriteUseCase<R: FavoriteRepository> {
    pub repo: R,
}

impl<R: FavoriteRepository> ContainsFavoriteUseCase<R> {
    pub async fn execute(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        self.repo.contains(username, movie_id).await
    }
}
