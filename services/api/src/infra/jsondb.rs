//! Flat-file persistence backend.
//!
//! Each collection is one JSON file rewritten whole on every mutation
//! (read-modify-write). A `tokio::sync::Mutex` per collection serializes
//! in-process writers, and every write lands via a temp file and an atomic
//! rename so readers only ever see a complete file. Concurrent writers in
//! OTHER processes still race last-write-wins, which is an accepted
//! limitation of file mode.
//!
//! File formats mirror the legacy layout exactly: users and links are
//! arrays of objects, reviews is `{ "reviews": [...] }`, favorites is an
//! object keyed by username.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use cinelink_domain::user::UserRole;

use crate::domain::repository::{
    FavoriteRepository, LinkRepository, ReviewRepository, UserRepository,
};
use crate::domain::types::{
    Favorite, Link, LinkPatch, LinkSummary, NewLink, NewReview, NewUser, RatedLink, Review,
    ReviewWithLink, User,
};
use crate::error::ApiError;

pub const USERS_FILE: &str = "users.json";
pub const LINKS_FILE: &str = "links.json";
pub const REVIEWS_FILE: &str = "reviews.json";
pub const FAVORITES_FILE: &str = "usersFavorites.json";

// ── File records (wire format of the flat files) ─────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    username: String,
    email: String,
    password: String,
    role: UserRole,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    url: String,
    username: String,
    movie_id: String,
    #[serde(default)]
    is_public: bool,
    added_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRecord {
    id: String,
    link_id: String,
    username: String,
    rating: u8,
    #[serde(default)]
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ReviewsFile {
    reviews: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteRecord {
    movie_id: String,
    added_date: DateTime<Utc>,
}

type FavoritesFile = BTreeMap<String, Vec<FavoriteRecord>>;

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password,
            role: r.role,
            created_at: r.created_at,
        }
    }
}

impl From<LinkRecord> for Link {
    fn from(r: LinkRecord) -> Self {
        Link {
            id: r.id,
            name: r.name,
            description: r.description,
            url: r.url,
            username: r.username,
            movie_id: r.movie_id,
            is_public: r.is_public,
            added_date: r.added_date,
        }
    }
}

impl From<ReviewRecord> for Review {
    fn from(r: ReviewRecord) -> Self {
        Review {
            id: r.id,
            link_id: r.link_id,
            username: r.username,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

// ── One collection = one file + one writer lock ──────────────────────────────

#[derive(Debug)]
struct FileCollection {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCollection {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Hold for the full read-modify-write cycle of a mutation.
    async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Read and parse the whole file. A missing or empty file is initialized
    /// with the default content; malformed JSON fails loudly with the path.
    async fn load<T>(&self) -> anyhow::Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default = T::default();
                self.store(&default).await?;
                return Ok(default);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            let default = T::default();
            self.store(&default).await?;
            return Ok(default);
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", self.path.display()))
    }

    /// Write the whole file through a temp file and an atomic rename, so a
    /// concurrent reader never parses a half-written file.
    async fn store<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))
    }
}

#[derive(Debug)]
struct Collections {
    users: FileCollection,
    links: FileCollection,
    reviews: FileCollection,
    favorites: FileCollection,
}

/// Handle to the four flat-file collections, shared by the file-backed
/// repositories.
#[derive(Debug, Clone)]
pub struct JsonDb {
    inner: Arc<Collections>,
}

impl JsonDb {
    /// Open (and if needed create) the data directory and the four
    /// collection files, validating that each parses. Malformed files abort
    /// startup with the offending path rather than silently discarding data.
    pub async fn open(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("create data dir {}", data_dir.display()))?;
        let db = Self {
            inner: Arc::new(Collections {
                users: FileCollection::new(data_dir.join(USERS_FILE)),
                links: FileCollection::new(data_dir.join(LINKS_FILE)),
                reviews: FileCollection::new(data_dir.join(REVIEWS_FILE)),
                favorites: FileCollection::new(data_dir.join(FAVORITES_FILE)),
            }),
        };
        let _: Vec<UserRecord> = db.inner.users.load().await?;
        let _: Vec<LinkRecord> = db.inner.links.load().await?;
        let _: ReviewsFile = db.inner.reviews.load().await?;
        let _: FavoritesFile = db.inner.favorites.load().await?;
        Ok(db)
    }

    /// File names of the collections that exist on disk, for the admin
    /// backend report.
    pub async fn collection_files(&self) -> Vec<String> {
        let mut names = Vec::new();
        for c in [
            &self.inner.users,
            &self.inner.links,
            &self.inner.reviews,
            &self.inner.favorites,
        ] {
            if tokio::fs::try_exists(&c.path).await.unwrap_or(false) {
                if let Some(name) = c.path.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        names
    }
}

fn average(reviews: &[ReviewRecord], link_id: &str) -> Option<f64> {
    let ratings: Vec<f64> = reviews
        .iter()
        .filter(|r| r.link_id == link_id)
        .map(|r| f64::from(r.rating))
        .collect();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JsonUserRepository {
    pub db: JsonDb,
}

impl UserRepository for JsonUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users.into_iter().find(|u| u.id == id).map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users
            .into_iter()
            .find(|u| u.username == username)
            .map(User::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users.iter().any(|u| u.username == username))
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> Result<bool, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users
            .iter()
            .any(|u| u.email == email && Some(u.id.as_str()) != exclude_id))
    }

    async fn create(&self, user: NewUser) -> Result<User, ApiError> {
        let _guard = self.db.inner.users.write_guard().await;
        let mut users: Vec<UserRecord> = self.db.inner.users.load().await?;
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.push(record.clone());
        self.db.inner.users.store(&users).await?;
        Ok(record.into())
    }

    async fn update_email_role(
        &self,
        id: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<User>, ApiError> {
        let _guard = self.db.inner.users.write_guard().await;
        let mut users: Vec<UserRecord> = self.db.inner.users.load().await?;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.email = email.to_owned();
        user.role = role;
        let updated = user.clone();
        self.db.inner.users.store(&users).await?;
        Ok(Some(updated.into()))
    }

    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError> {
        // Fixed lock order (users, links, reviews, favorites). Dependent
        // collections are written first and the users file last: a failure
        // mid-cascade leaves the user record in place, and re-running the
        // delete re-filters the already-clean files and finishes the job.
        let c = &self.db.inner;
        let _users = c.users.write_guard().await;
        let _links = c.links.write_guard().await;
        let _reviews = c.reviews.write_guard().await;
        let _favorites = c.favorites.write_guard().await;

        let mut users: Vec<UserRecord> = c.users.load().await?;
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Ok(false);
        };
        let username = users[idx].username.clone();

        let mut links: Vec<LinkRecord> = c.links.load().await?;
        let own_link_ids: Vec<String> = links
            .iter()
            .filter(|l| l.username == username)
            .map(|l| l.id.clone())
            .collect();
        links.retain(|l| l.username != username);
        c.links.store(&links).await?;

        // Reviews the user authored anywhere, plus anyone's reviews on the
        // links that just went away.
        let mut reviews: ReviewsFile = c.reviews.load().await?;
        reviews
            .reviews
            .retain(|r| r.username != username && !own_link_ids.contains(&r.link_id));
        c.reviews.store(&reviews).await?;

        let mut favorites: FavoritesFile = c.favorites.load().await?;
        favorites.remove(&username);
        c.favorites.store(&favorites).await?;

        users.remove(idx);
        c.users.store(&users).await?;
        Ok(true)
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let users: Vec<UserRecord> = self.db.inner.users.load().await?;
        Ok(users.len() as u64)
    }
}

// ── Link repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JsonLinkRepository {
    pub db: JsonDb,
}

impl JsonLinkRepository {
    async fn delete_cascade_inner(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<bool, ApiError> {
        let c = &self.db.inner;
        let _links = c.links.write_guard().await;
        let _reviews = c.reviews.write_guard().await;

        let mut links: Vec<LinkRecord> = c.links.load().await?;
        let Some(idx) = links
            .iter()
            .position(|l| l.id == id && owner.is_none_or(|o| l.username == o))
        else {
            return Ok(false);
        };
        links.remove(idx);
        c.links.store(&links).await?;

        let mut reviews: ReviewsFile = c.reviews.load().await?;
        reviews.reviews.retain(|r| r.link_id != id);
        c.reviews.store(&reviews).await?;

        Ok(true)
    }
}

impl LinkRepository for JsonLinkRepository {
    async fn list_for_movie(
        &self,
        movie_id: &str,
        viewer: &str,
    ) -> Result<Vec<RatedLink>, ApiError> {
        let links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(links
            .into_iter()
            .filter(|l| l.movie_id == movie_id && (l.username == viewer || l.is_public))
            .map(|l| RatedLink {
                avg_rating: average(&reviews.reviews, &l.id),
                link: l.into(),
            })
            .collect())
    }

    async fn list_public(&self) -> Result<Vec<RatedLink>, ApiError> {
        let links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(links
            .into_iter()
            .filter(|l| l.is_public)
            .map(|l| RatedLink {
                avg_rating: average(&reviews.reviews, &l.id),
                link: l.into(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Link>, ApiError> {
        let links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        Ok(links.into_iter().find(|l| l.id == id).map(Link::from))
    }

    async fn create(&self, link: NewLink) -> Result<Link, ApiError> {
        let _guard = self.db.inner.links.write_guard().await;
        let mut links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        let record = LinkRecord {
            id: Uuid::new_v4().to_string(),
            name: link.name,
            description: link.description,
            url: link.url,
            username: link.username,
            movie_id: link.movie_id,
            is_public: link.is_public,
            added_date: Utc::now(),
        };
        links.push(record.clone());
        self.db.inner.links.store(&links).await?;
        Ok(record.into())
    }

    async fn update_owned(
        &self,
        id: &str,
        owner: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, ApiError> {
        let _guard = self.db.inner.links.write_guard().await;
        let mut links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        let Some(link) = links
            .iter_mut()
            .find(|l| l.id == id && l.username == owner)
        else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            link.name = name;
        }
        if let Some(description) = patch.description {
            link.description = description;
        }
        if let Some(url) = patch.url {
            link.url = url;
        }
        if let Some(is_public) = patch.is_public {
            link.is_public = is_public;
        }
        let updated = link.clone();
        self.db.inner.links.store(&links).await?;
        Ok(Some(updated.into()))
    }

    async fn delete_owned_cascade(&self, id: &str, owner: &str) -> Result<bool, ApiError> {
        self.delete_cascade_inner(id, Some(owner)).await
    }

    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError> {
        self.delete_cascade_inner(id, None).await
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        Ok(links.len() as u64)
    }
}

// ── Review repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JsonReviewRepository {
    pub db: JsonDb,
}

impl ReviewRepository for JsonReviewRepository {
    async fn list_for_link(&self, link_id: &str) -> Result<Vec<Review>, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(reviews
            .reviews
            .into_iter()
            .filter(|r| r.link_id == link_id)
            .map(Review::from)
            .collect())
    }

    async fn list_with_links(&self) -> Result<Vec<ReviewWithLink>, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        let links: Vec<LinkRecord> = self.db.inner.links.load().await?;
        let mut joined: Vec<ReviewWithLink> = reviews
            .reviews
            .into_iter()
            .filter_map(|r| {
                let link = links.iter().find(|l| l.id == r.link_id)?;
                Some(ReviewWithLink {
                    link: LinkSummary {
                        name: link.name.clone(),
                        movie_id: link.movie_id.clone(),
                        is_public: link.is_public,
                        url: link.url.clone(),
                    },
                    review: r.into(),
                })
            })
            .collect();
        joined.sort_by(|a, b| {
            b.review
                .rating
                .cmp(&a.review.rating)
                .then(b.review.created_at.cmp(&a.review.created_at))
        });
        Ok(joined)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(reviews
            .reviews
            .into_iter()
            .find(|r| r.id == id)
            .map(Review::from))
    }

    async fn exists_for(&self, link_id: &str, username: &str) -> Result<bool, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(reviews
            .reviews
            .iter()
            .any(|r| r.link_id == link_id && r.username == username))
    }

    async fn create(&self, review: NewReview) -> Result<Review, ApiError> {
        let _guard = self.db.inner.reviews.write_guard().await;
        let mut reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        // Re-checked under the lock: the use-case pre-check can race with a
        // concurrent writer in the same process.
        if reviews
            .reviews
            .iter()
            .any(|r| r.link_id == review.link_id && r.username == review.username)
        {
            return Err(ApiError::DuplicateReview);
        }
        let record = ReviewRecord {
            id: Uuid::new_v4().to_string(),
            link_id: review.link_id,
            username: review.username,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        reviews.reviews.push(record.clone());
        self.db.inner.reviews.store(&reviews).await?;
        Ok(record.into())
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let _guard = self.db.inner.reviews.write_guard().await;
        let mut reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        let before = reviews.reviews.len();
        reviews.reviews.retain(|r| r.id != id);
        if reviews.reviews.len() == before {
            return Ok(false);
        }
        self.db.inner.reviews.store(&reviews).await?;
        Ok(true)
    }

    async fn average_rating(&self, link_id: &str) -> Result<Option<f64>, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(average(&reviews.reviews, link_id))
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let reviews: ReviewsFile = self.db.inner.reviews.load().await?;
        Ok(reviews.reviews.len() as u64)
    }
}

// ── Favorite repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct JsonFavoriteRepository {
    pub db: JsonDb,
}

impl FavoriteRepository for JsonFavoriteRepository {
    async fn list(&self, username: &str) -> Result<Vec<Favorite>, ApiError> {
        let favorites: FavoritesFile = self.db.inner.favorites.load().await?;
        Ok(favorites
            .get(username)
            .map(|favs| {
                favs.iter()
                    .map(|f| Favorite {
                        movie_id: f.movie_id.clone(),
                        added_date: f.added_date,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn contains(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        let favorites: FavoritesFile = self.db.inner.favorites.load().await?;
        Ok(favorites
            .get(username)
            .is_some_and(|favs| favs.iter().any(|f| f.movie_id == movie_id)))
    }

    async fn add(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        let _guard = self.db.inner.favorites.write_guard().await;
        let mut favorites: FavoritesFile = self.db.inner.favorites.load().await?;
        let entries = favorites.entry(username.to_owned()).or_default();
        if entries.iter().any(|f| f.movie_id == movie_id) {
            return Ok(false);
        }
        entries.push(FavoriteRecord {
            movie_id: movie_id.to_owned(),
            added_date: Utc::now(),
        });
        self.db.inner.favorites.store(&favorites).await?;
        Ok(true)
    }

    async fn remove(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        let _guard = self.db.inner.favorites.write_guard().await;
        let mut favorites: FavoritesFile = self.db.inner.favorites.load().await?;
        let Some(entries) = favorites.get_mut(username) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|f| f.movie_id != movie_id);
        if entries.len() == before {
            return Ok(false);
        }
        self.db.inner.favorites.store(&favorites).await?;
        Ok(true)
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let favorites: FavoritesFile = self.db.inner.favorites.load().await?;
        Ok(favorites.values().map(|favs| favs.len() as u64).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_db() -> (tempfile::TempDir, JsonDb) {
        let dir = tempfile::tempdir().unwrap();
        let db = JsonDb::open(dir.path()).await.unwrap();
        (dir, db)
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: "$argon2id$test".to_owned(),
            role: UserRole::User,
        }
    }

    fn new_link(username: &str, movie_id: &str, is_public: bool) -> NewLink {
        NewLink {
            name: "Site".to_owned(),
            description: String::new(),
            url: "https://x.com".to_owned(),
            username: username.to_owned(),
            movie_id: movie_id.to_owned(),
            is_public,
        }
    }

    fn new_review(link_id: &str, username: &str, rating: u8) -> NewReview {
        NewReview {
            link_id: link_id.to_owned(),
            username: username.to_owned(),
            rating,
            comment: None,
        }
    }

    #[tokio::test]
    async fn should_create_missing_files_with_empty_defaults() {
        let (dir, _db) = open_db().await;
        for name in [USERS_FILE, LINKS_FILE, REVIEWS_FILE, FAVORITES_FILE] {
            assert!(dir.path().join(name).exists(), "{name} created on open");
        }
        let raw = std::fs::read_to_string(dir.path().join(REVIEWS_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["reviews"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_fail_loudly_on_malformed_collection_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(USERS_FILE), "[{broken").unwrap();
        let err = JsonDb::open(dir.path()).await.unwrap_err().to_string();
        assert!(err.contains(USERS_FILE), "error names the file: {err}");
    }

    #[tokio::test]
    async fn should_keep_favorites_keyed_by_username_on_disk() {
        let (dir, db) = open_db().await;
        let repo = JsonFavoriteRepository { db };
        repo.add("alice", "tt001").await.unwrap();
        let raw = std::fs::read_to_string(dir.path().join(FAVORITES_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["alice"][0]["movieId"], "tt001");
    }

    #[tokio::test]
    async fn should_treat_duplicate_favorite_add_as_noop() {
        let (_dir, db) = open_db().await;
        let repo = JsonFavoriteRepository { db };
        assert!(repo.add("alice", "tt001").await.unwrap());
        assert!(!repo.add("alice", "tt001").await.unwrap());
        assert_eq!(repo.list("alice").await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_compute_average_rating_and_none_when_unreviewed() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db: db.clone() };
        let reviews = JsonReviewRepository { db };

        let link = links.create(new_link("alice", "tt001", true)).await.unwrap();
        assert_eq!(reviews.average_rating(&link.id).await.unwrap(), None);

        reviews.create(new_review(&link.id, "alice", 4)).await.unwrap();
        reviews.create(new_review(&link.id, "bob", 2)).await.unwrap();
        assert_eq!(reviews.average_rating(&link.id).await.unwrap(), Some(3.0));
    }

    #[tokio::test]
    async fn should_reject_second_review_from_same_user_under_lock() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db: db.clone() };
        let reviews = JsonReviewRepository { db };

        let link = links.create(new_link("alice", "tt001", true)).await.unwrap();
        reviews.create(new_review(&link.id, "alice", 4)).await.unwrap();
        let result = reviews.create(new_review(&link.id, "alice", 2)).await;
        assert!(matches!(result, Err(ApiError::DuplicateReview)));
        // Original review untouched.
        assert_eq!(reviews.average_rating(&link.id).await.unwrap(), Some(4.0));
    }

    #[tokio::test]
    async fn should_cascade_link_delete_to_its_reviews_only() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db: db.clone() };
        let reviews = JsonReviewRepository { db };

        let keep = links.create(new_link("alice", "tt001", true)).await.unwrap();
        let gone = links.create(new_link("alice", "tt002", true)).await.unwrap();
        reviews.create(new_review(&keep.id, "bob", 5)).await.unwrap();
        reviews.create(new_review(&gone.id, "bob", 1)).await.unwrap();

        assert!(links.delete_owned_cascade(&gone.id, "alice").await.unwrap());
        assert!(links.find_by_id(&gone.id).await.unwrap().is_none());
        assert!(reviews.list_for_link(&gone.id).await.unwrap().is_empty());
        assert_eq!(reviews.list_for_link(&keep.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_not_delete_link_owned_by_someone_else() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db };
        let link = links.create(new_link("alice", "tt001", true)).await.unwrap();
        assert!(!links.delete_owned_cascade(&link.id, "bob").await.unwrap());
        assert!(links.find_by_id(&link.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn should_cascade_user_delete_across_all_collections() {
        let (_dir, db) = open_db().await;
        let users = JsonUserRepository { db: db.clone() };
        let links = JsonLinkRepository { db: db.clone() };
        let reviews = JsonReviewRepository { db: db.clone() };
        let favorites = JsonFavoriteRepository { db };

        let alice = users.create(new_user("alice", "a@x.com")).await.unwrap();
        users.create(new_user("bob", "b@x.com")).await.unwrap();

        let alice_link = links.create(new_link("alice", "tt001", true)).await.unwrap();
        let bob_link = links.create(new_link("bob", "tt002", true)).await.unwrap();
        reviews
            .create(new_review(&bob_link.id, "alice", 3))
            .await
            .unwrap();
        reviews
            .create(new_review(&alice_link.id, "bob", 5))
            .await
            .unwrap();
        favorites.add("alice", "tt001").await.unwrap();
        favorites.add("bob", "tt002").await.unwrap();

        assert!(users.delete_cascade(&alice.id).await.unwrap());

        // Exhaustive post-condition scan: nothing of alice's survives and
        // all of bob's data does. Bob's review on alice's link goes with the
        // link it referenced, so no review remains at all.
        assert!(users.find_by_username("alice").await.unwrap().is_none());
        assert!(users.find_by_username("bob").await.unwrap().is_some());
        assert!(links.find_by_id(&alice_link.id).await.unwrap().is_none());
        assert!(links.find_by_id(&bob_link.id).await.unwrap().is_some());
        assert!(reviews.list_for_link(&bob_link.id).await.unwrap().is_empty());
        assert_eq!(reviews.count().await.unwrap(), 0);
        assert!(favorites.list("alice").await.unwrap().is_empty());
        assert_eq!(favorites.list("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_not_orphan_foreign_reviews_on_a_deleted_users_links() {
        let (_dir, db) = open_db().await;
        let users = JsonUserRepository { db: db.clone() };
        let links = JsonLinkRepository { db: db.clone() };
        let reviews = JsonReviewRepository { db };

        let alice = users.create(new_user("alice", "a@x.com")).await.unwrap();
        users.create(new_user("bob", "b@x.com")).await.unwrap();
        let alice_link = links.create(new_link("alice", "tt001", true)).await.unwrap();
        let bob_link = links.create(new_link("bob", "tt002", true)).await.unwrap();
        reviews
            .create(new_review(&alice_link.id, "bob", 5))
            .await
            .unwrap();
        reviews
            .create(new_review(&bob_link.id, "bob", 2))
            .await
            .unwrap();

        assert!(users.delete_cascade(&alice.id).await.unwrap());

        // Bob's review on alice's (now deleted) link is gone; his review on
        // his own link is not.
        assert!(reviews.list_for_link(&alice_link.id).await.unwrap().is_empty());
        assert_eq!(reviews.list_for_link(&bob_link.id).await.unwrap().len(), 1);
        assert_eq!(reviews.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_finish_user_cascade_when_rerun_after_partial_failure() {
        let (dir, db) = open_db().await;
        let users = JsonUserRepository { db: db.clone() };
        let links = JsonLinkRepository { db: db.clone() };
        let favorites = JsonFavoriteRepository { db };

        let alice = users.create(new_user("alice", "a@x.com")).await.unwrap();
        links.create(new_link("alice", "tt001", true)).await.unwrap();
        favorites.add("alice", "tt001").await.unwrap();

        // Simulate a cascade that crashed after clearing the dependent
        // collections but before the users file was rewritten.
        std::fs::write(dir.path().join(LINKS_FILE), "[]").unwrap();
        std::fs::write(dir.path().join(FAVORITES_FILE), "{}").unwrap();

        // The user record is still there, so the retry completes the delete.
        assert!(users.delete_cascade(&alice.id).await.unwrap());
        assert!(users.find_by_username("alice").await.unwrap().is_none());
        assert!(links.count().await.unwrap() == 0);
        assert!(favorites.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_serve_consistent_reads_during_concurrent_writes() {
        let (_dir, db) = open_db().await;
        let writer = JsonFavoriteRepository { db: db.clone() };
        let reader = JsonFavoriteRepository { db };

        let handle = tokio::spawn(async move {
            for i in 0..50 {
                writer.add("alice", &format!("tt{i:03}")).await.unwrap();
            }
        });
        // Interleaved reads must always parse a complete file.
        for _ in 0..50 {
            reader.list("alice").await.unwrap();
            tokio::task::yield_now().await;
        }
        handle.await.unwrap();
        assert_eq!(reader.list("alice").await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn should_return_false_when_cascading_missing_user() {
        let (_dir, db) = open_db().await;
        let users = JsonUserRepository { db };
        assert!(!users.delete_cascade("no-such-id").await.unwrap());
    }

    #[tokio::test]
    async fn should_update_only_owned_links() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db };
        let link = links.create(new_link("alice", "tt001", false)).await.unwrap();

        let patch = LinkPatch {
            name: Some("Better site".to_owned()),
            is_public: Some(true),
            ..Default::default()
        };
        let updated = links
            .update_owned(&link.id, "alice", patch.clone())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Better site");
        assert!(updated.is_public);

        assert!(links.update_owned(&link.id, "bob", patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_filter_movie_links_by_visibility() {
        let (_dir, db) = open_db().await;
        let links = JsonLinkRepository { db };
        links.create(new_link("alice", "tt001", false)).await.unwrap();
        links.create(new_link("bob", "tt001", false)).await.unwrap();
        links.create(new_link("bob", "tt001", true)).await.unwrap();
        links.create(new_link("bob", "tt999", true)).await.unwrap();

        let visible = links.list_for_movie("tt001", "alice").await.unwrap();
        assert_eq!(visible.len(), 2); // alice's private + bob's public
        assert!(visible.iter().all(|l| l.avg_rating.is_none()));
    }
}
