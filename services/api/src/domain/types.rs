//! Domain types for the API service.
//!
//! Identifiers are opaque strings: the database backend assigns UUIDs stored
//! as native uuid columns, the file backend assigns UUID strings. Callers
//! must never assume a format.

use chrono::{DateTime, Utc};

use cinelink_domain::movie::ProbeStatus;
use cinelink_domain::user::UserRole;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub username: String,
    pub movie_id: String,
    pub is_public: bool,
    pub added_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLink {
    pub name: String,
    pub description: String,
    pub url: String,
    pub username: String,
    pub movie_id: String,
    pub is_public: bool,
}

/// Partial update for a link; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_public: Option<bool>,
}

/// A link annotated with its derived average rating.
///
/// `avg_rating` is `None` when the link has no reviews — never zero, so an
/// unrated link is distinguishable from one rated zero by every caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedLink {
    pub link: Link,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub link_id: String,
    pub username: String,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub link_id: String,
    pub username: String,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Link metadata joined onto a review for the admin listing.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub name: String,
    pub movie_id: String,
    pub is_public: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewWithLink {
    pub review: Review,
    pub link: LinkSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Favorite {
    pub movie_id: String,
    pub added_date: DateTime<Utc>,
}

/// Entity counts for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    pub users: u64,
    pub links: u64,
    pub reviews: u64,
    pub favorites: u64,
}

/// Identity and health of the active persistence backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReport {
    pub kind: String,
    pub status: String,
    pub location: String,
    pub collections: Vec<String>,
}

/// Result of probing one external API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReport {
    pub name: String,
    pub description: String,
    pub status: ProbeStatus,
    pub status_code: Option<u16>,
    pub checked_at: DateTime<Utc>,
}
