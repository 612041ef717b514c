#![allow(async_fn_in_trait)]

use cinelink_domain::movie::MovieSummary;
use cinelink_domain::user::UserRole;

use crate::domain::types::{
    ApiReport, BackendReport, Favorite, Link, LinkPatch, NewLink, NewReview, NewUser, RatedLink,
    Review, ReviewWithLink, User,
};
use crate::error::ApiError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, ApiError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn username_exists(&self, username: &str) -> Result<bool, ApiError>;

    /// True when `email` belongs to a user other than `exclude_id` (pass
    /// `None` to match any user).
    async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> Result<bool, ApiError>;

    /// Create a user; the backend assigns the identifier.
    async fn create(&self, user: NewUser) -> Result<User, ApiError>;

    async fn update_email_role(
        &self,
        id: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<User>, ApiError>;

    /// Delete the user AND every link they own, every review they authored,
    /// every review anyone left on those links, and their favorites map
    /// entry — no review may survive referencing a deleted link or user.
    /// Runs in one transaction in database mode; in file mode all four
    /// collections are locked, the dependents are rewritten first and the
    /// users file last, so a partial failure is safely retryable. Returns
    /// `false` when the user does not exist (nothing is mutated).
    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError>;

    async fn count(&self) -> Result<u64, ApiError>;
}

/// Repository for watch links.
pub trait LinkRepository: Send + Sync {
    /// Links for a movie visible to `viewer`: owned by the viewer OR public,
    /// each annotated with its average rating (`None` when unreviewed).
    async fn list_for_movie(
        &self,
        movie_id: &str,
        viewer: &str,
    ) -> Result<Vec<RatedLink>, ApiError>;

    /// All public links annotated with average ratings, unsorted.
    async fn list_public(&self) -> Result<Vec<RatedLink>, ApiError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Link>, ApiError>;

    /// Create a link; the backend assigns the identifier.
    async fn create(&self, link: NewLink) -> Result<Link, ApiError>;

    /// Update a link only when it exists AND belongs to `owner`.
    /// Existence and ownership are deliberately indistinguishable: both
    /// come back as `None`.
    async fn update_owned(
        &self,
        id: &str,
        owner: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, ApiError>;

    /// Owner-scoped delete cascading the link's reviews. Returns `false`
    /// when the link does not exist or is not owned by `owner`.
    async fn delete_owned_cascade(&self, id: &str, owner: &str) -> Result<bool, ApiError>;

    /// Admin delete cascading the link's reviews, regardless of owner.
    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError>;

    async fn count(&self) -> Result<u64, ApiError>;
}

/// Repository for link reviews.
pub trait ReviewRepository: Send + Sync {
    async fn list_for_link(&self, link_id: &str) -> Result<Vec<Review>, ApiError>;

    /// Every review joined with its link's metadata, sorted by rating then
    /// recency (both descending).
    async fn list_with_links(&self) -> Result<Vec<ReviewWithLink>, ApiError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, ApiError>;

    /// One review per user per link — the write-time guard behind the
    /// `(link_id, username)` invariant.
    async fn exists_for(&self, link_id: &str, username: &str) -> Result<bool, ApiError>;

    async fn create(&self, review: NewReview) -> Result<Review, ApiError>;

    /// Returns `false` when no review matched.
    async fn delete(&self, id: &str) -> Result<bool, ApiError>;

    /// Arithmetic mean of the link's review ratings; `None` (not zero) when
    /// the link has no reviews, in both backends.
    async fn average_rating(&self, link_id: &str) -> Result<Option<f64>, ApiError>;

    async fn count(&self) -> Result<u64, ApiError>;
}

/// Repository for favorited external movies.
pub trait FavoriteRepository: Send + Sync {
    async fn list(&self, username: &str) -> Result<Vec<Favorite>, ApiError>;
    async fn contains(&self, username: &str, movie_id: &str) -> Result<bool, ApiError>;

    /// Idempotent: adding an already-favorited movie is a no-op. Returns
    /// `true` when a new entry was written.
    async fn add(&self, username: &str, movie_id: &str) -> Result<bool, ApiError>;

    /// Removing an absent entry is also a no-op; returns `true` when an
    /// entry was actually removed.
    async fn remove(&self, username: &str, movie_id: &str) -> Result<bool, ApiError>;

    async fn count(&self) -> Result<u64, ApiError>;
}

/// Port for the external movie catalog and trailer APIs.
///
/// Empty results are normal outcomes, never errors; only transport failures
/// surface as `ApiError`.
pub trait MovieCatalogPort: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError>;
    async fn lookup(&self, imdb_id: &str) -> Result<Option<MovieSummary>, ApiError>;
    async fn trailer(&self, title: &str) -> Result<Option<String>, ApiError>;

    /// Probe each upstream API with a bounded timeout. Failures degrade to
    /// an offline/timeout report, never an `Err`.
    async fn probe(&self) -> Vec<ApiReport>;
}

/// Port for describing the active persistence backend on the admin panel.
pub trait BackendInspectPort: Send + Sync {
    async fn report(&self) -> Result<BackendReport, ApiError>;
}
