//! Watch-link use cases.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::repository::{LinkRepository, ReviewRepository};
use crate::domain::types::{Link, LinkPatch, NewLink, RatedLink};
use crate::error::ApiError;

/// Descending by average; unrated links sort last.
fn by_avg_desc(a: &RatedLink, b: &RatedLink) -> Ordering {
    match (a.avg_rating, b.avg_rating) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── GetMovieLinks ────────────────────────────────────────────────────────────

pub struct GetMovieLinksUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> GetMovieLinksUseCase<R> {
    pub async fn execute(&self, movie_id: &str, viewer: &str) -> Result<Vec<RatedLink>, ApiError> {
        self.repo.list_for_movie(movie_id, viewer).await
    }
}

// ── GetLink ──────────────────────────────────────────────────────────────────

pub struct GetLinkUseCase<L: LinkRepository, V: ReviewRepository> {
    pub links: L,
    pub reviews: V,
}

impl<L: LinkRepository, V: ReviewRepository> GetLinkUseCase<L, V> {
    /// A private link is only visible to its owner; anything else reads as
    /// not-found.
    pub async fn execute(&self, id: &str, viewer: &str) -> Result<RatedLink, ApiError> {
        let Some(link) = self.links.find_by_id(id).await? else {
            return Err(ApiError::LinkNotFound);
        };
        if !link.is_public && link.username != viewer {
            return Err(ApiError::LinkNotFound);
        }
        let avg_rating = self.reviews.average_rating(&link.id).await?;
        Ok(RatedLink { link, avg_rating })
    }
}

// ── UpsertLink ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UpsertLinkInput {
    /// `Some` updates an existing owned link; `None` creates one. An unknown
    /// or foreign id is rejected as not-found, never inserted.
    pub link_id: Option<String>,
    pub name: String,
    pub description: String,
    pub url: String,
    pub is_public: bool,
}

pub struct UpsertLinkUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> UpsertLinkUseCase<R> {
    pub async fn execute(
        &self,
        owner: &str,
        movie_id: &str,
        input: UpsertLinkInput,
    ) -> Result<Link, ApiError> {
        if input.name.trim().is_empty() || input.url.trim().is_empty() {
            return Err(ApiError::Validation(
                "Link name and URL are required.".to_owned(),
            ));
        }
        match input.link_id {
            Some(link_id) => {
                let patch = LinkPatch {
                    name: Some(input.name),
                    description: Some(input.description),
                    url: Some(input.url),
                    is_public: Some(input.is_public),
                };
                self.repo
                    .update_owned(&link_id, owner, patch)
                    .await?
                    .ok_or(ApiError::LinkNotFound)
            }
            None => {
                self.repo
                    .create(NewLink {
                        name: input.name,
                        description: input.description,
                        url: input.url,
                        username: owner.to_owned(),
                        movie_id: movie_id.to_owned(),
                        is_public: input.is_public,
                    })
                    .await
            }
        }
    }
}

// ── DeleteLink (owner-scoped) ────────────────────────────────────────────────

pub struct DeleteLinkUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> DeleteLinkUseCase<R> {
    pub async fn execute(&self, id: &str, owner: &str) -> Result<(), ApiError> {
        if !self.repo.delete_owned_cascade(id, owner).await? {
            return Err(ApiError::LinkNotFound);
        }
        Ok(())
    }
}

// ── AdminDeleteLink ──────────────────────────────────────────────────────────

pub struct AdminDeleteLinkUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> AdminDeleteLinkUseCase<R> {
    pub async fn execute(&self, id: &str) -> Result<(), ApiError> {
        if !self.repo.delete_cascade(id).await? {
            return Err(ApiError::LinkNotFound);
        }
        Ok(())
    }
}

// ── TopLinks ─────────────────────────────────────────────────────────────────

pub struct TopLinksUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> TopLinksUseCase<R> {
    /// The single best-rated public link per movie, sorted by average
    /// rating descending with unrated movies last.
    pub async fn execute(&self) -> Result<Vec<RatedLink>, ApiError> {
        let mut best: HashMap<String, RatedLink> = HashMap::new();
        for candidate in self.repo.list_public().await? {
            match best.get(&candidate.link.movie_id) {
                Some(current) if by_avg_desc(current, &candidate) != Ordering::Greater => {}
                _ => {
                    best.insert(candidate.link.movie_id.clone(), candidate);
                }
            }
        }
        let mut top: Vec<RatedLink> = best.into_values().collect();
        top.sort_by(by_avg_desc);
        Ok(top)
    }
}

// ── PublicLinks (admin listing) ──────────────────────────────────────────────

pub struct PublicLinksUseCase<R: LinkRepository> {
    pub repo: R,
}

impl<R: LinkRepository> PublicLinksUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<RatedLink>, ApiError> {
        let mut links = self.repo.list_public().await?;
        links.sort_by(by_avg_desc);
        Ok(links)
    }
}
