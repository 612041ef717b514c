//! Database persistence backend on sea-orm.
//!
//! Identifiers are native UUID columns; the repository surface exposes them
//! as strings, so an unparsable id from a caller simply matches nothing
//! (`Ok(None)` / `Ok(false)`) instead of erroring.
//!
//! Cascades run inside explicit transactions rather than leaning on the
//! schema's ON DELETE CASCADE, so both backends observe identical semantics.

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use cinelink_domain::user::UserRole;
use cinelink_schema::{favorites, links, reviews, users};

use crate::domain::repository::{
    FavoriteRepository, LinkRepository, ReviewRepository, UserRepository,
};
use crate::domain::types::{
    Favorite, Link, LinkPatch, LinkSummary, NewLink, NewReview, NewUser, RatedLink, Review,
    ReviewWithLink, User,
};
use crate::error::ApiError;

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        User {
            id: m.id.to_string(),
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            // Unknown role strings cannot be written through this API;
            // anything else in the column is treated as a plain user.
            role: UserRole::from_str_value(&m.role).unwrap_or_default(),
            created_at: m.created_at,
        }
    }
}

impl From<links::Model> for Link {
    fn from(m: links::Model) -> Self {
        Link {
            id: m.id.to_string(),
            name: m.name,
            description: m.description,
            url: m.url,
            username: m.username,
            movie_id: m.movie_id,
            is_public: m.is_public,
            added_date: m.added_date,
        }
    }
}

impl From<reviews::Model> for Review {
    fn from(m: reviews::Model) -> Self {
        Review {
            id: m.id.to_string(),
            link_id: m.link_id.to_string(),
            username: m.username,
            rating: m.rating.clamp(0, u8::MAX as i16) as u8,
            comment: m.comment,
            created_at: m.created_at,
        }
    }
}

fn average(ratings: &[i16]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_all(&self) -> Result<Vec<User>, ApiError> {
        let models = users::Entity::find()
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find user by username")?;
        Ok(model.map(User::from))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, ApiError> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await
            .context("count username")?;
        Ok(count > 0)
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<&str>) -> Result<bool, ApiError> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = exclude_id.and_then(parse_id) {
            query = query.filter(users::Column::Id.ne(id));
        }
        let count = query.count(&self.db).await.context("count email")?;
        Ok(count > 0)
    }

    async fn create(&self, user: NewUser) -> Result<User, ApiError> {
        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            role: Set(user.role.as_str().to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert user")?;
        Ok(model.into())
    }

    async fn update_email_role(
        &self,
        id: &str,
        email: &str,
        role: UserRole,
    ) -> Result<Option<User>, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let Some(model) = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user for update")?
        else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        active.email = Set(email.to_owned());
        active.role = Set(role.as_str().to_owned());
        let updated = active.update(&self.db).await.context("update user")?;
        Ok(Some(updated.into()))
    }

    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let txn = self.db.begin().await.context("begin user cascade")?;

        let Some(user) = users::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("find user for cascade")?
        else {
            return Ok(false);
        };

        let link_ids: Vec<Uuid> = links::Entity::find()
            .filter(links::Column::Username.eq(&user.username))
            .all(&txn)
            .await
            .context("list user links for cascade")?
            .into_iter()
            .map(|l| l.id)
            .collect();

        // Reviews the user authored anywhere, plus anyone's reviews on the
        // user's own links.
        reviews::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(reviews::Column::Username.eq(&user.username))
                    .add(reviews::Column::LinkId.is_in(link_ids)),
            )
            .exec(&txn)
            .await
            .context("delete reviews in user cascade")?;
        links::Entity::delete_many()
            .filter(links::Column::Username.eq(&user.username))
            .exec(&txn)
            .await
            .context("delete links in user cascade")?;
        favorites::Entity::delete_many()
            .filter(favorites::Column::Username.eq(&user.username))
            .exec(&txn)
            .await
            .context("delete favorites in user cascade")?;
        users::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete user in cascade")?;

        txn.commit().await.context("commit user cascade")?;
        Ok(true)
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(users::Entity::find()
            .count(&self.db)
            .await
            .context("count users")?)
    }
}

// ── Link repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbLinkRepository {
    pub db: DatabaseConnection,
}

impl DbLinkRepository {
    /// Annotate link models with average ratings fetched in one query.
    async fn rate(&self, models: Vec<links::Model>) -> Result<Vec<RatedLink>, ApiError> {
        let ids: Vec<Uuid> = models.iter().map(|l| l.id).collect();
        let reviews = reviews::Entity::find()
            .filter(reviews::Column::LinkId.is_in(ids))
            .all(&self.db)
            .await
            .context("list reviews for rating")?;
        Ok(models
            .into_iter()
            .map(|l| {
                let ratings: Vec<i16> = reviews
                    .iter()
                    .filter(|r| r.link_id == l.id)
                    .map(|r| r.rating)
                    .collect();
                RatedLink {
                    avg_rating: average(&ratings),
                    link: l.into(),
                }
            })
            .collect())
    }

    async fn delete_cascade_inner(
        &self,
        id: &str,
        owner: Option<&str>,
    ) -> Result<bool, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let txn = self.db.begin().await.context("begin link cascade")?;

        let mut query = links::Entity::find_by_id(id);
        if let Some(owner) = owner {
            query = query.filter(links::Column::Username.eq(owner));
        }
        if query
            .one(&txn)
            .await
            .context("find link for cascade")?
            .is_none()
        {
            return Ok(false);
        }

        reviews::Entity::delete_many()
            .filter(reviews::Column::LinkId.eq(id))
            .exec(&txn)
            .await
            .context("delete reviews in link cascade")?;
        links::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete link in cascade")?;

        txn.commit().await.context("commit link cascade")?;
        Ok(true)
    }
}

impl LinkRepository for DbLinkRepository {
    async fn list_for_movie(
        &self,
        movie_id: &str,
        viewer: &str,
    ) -> Result<Vec<RatedLink>, ApiError> {
        let models = links::Entity::find()
            .filter(links::Column::MovieId.eq(movie_id))
            .filter(
                Condition::any()
                    .add(links::Column::Username.eq(viewer))
                    .add(links::Column::IsPublic.eq(true)),
            )
            .all(&self.db)
            .await
            .context("list links for movie")?;
        self.rate(models).await
    }

    async fn list_public(&self) -> Result<Vec<RatedLink>, ApiError> {
        let models = links::Entity::find()
            .filter(links::Column::IsPublic.eq(true))
            .all(&self.db)
            .await
            .context("list public links")?;
        self.rate(models).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Link>, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let model = links::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find link by id")?;
        Ok(model.map(Link::from))
    }

    async fn create(&self, link: NewLink) -> Result<Link, ApiError> {
        let model = links::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(link.name),
            description: Set(link.description),
            url: Set(link.url),
            username: Set(link.username),
            movie_id: Set(link.movie_id),
            is_public: Set(link.is_public),
            added_date: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert link")?;
        Ok(model.into())
    }

    async fn update_owned(
        &self,
        id: &str,
        owner: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let Some(model) = links::Entity::find_by_id(id)
            .filter(links::Column::Username.eq(owner))
            .one(&self.db)
            .await
            .context("find link for update")?
        else {
            return Ok(None);
        };
        let mut active = model.into_active_model();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(url) = patch.url {
            active.url = Set(url);
        }
        if let Some(is_public) = patch.is_public {
            active.is_public = Set(is_public);
        }
        let updated = active.update(&self.db).await.context("update link")?;
        Ok(Some(updated.into()))
    }

    async fn delete_owned_cascade(&self, id: &str, owner: &str) -> Result<bool, ApiError> {
        self.delete_cascade_inner(id, Some(owner)).await
    }

    async fn delete_cascade(&self, id: &str) -> Result<bool, ApiError> {
        self.delete_cascade_inner(id, None).await
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(links::Entity::find()
            .count(&self.db)
            .await
            .context("count links")?)
    }
}

// ── Review repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbReviewRepository {
    pub db: DatabaseConnection,
}

impl ReviewRepository for DbReviewRepository {
    async fn list_for_link(&self, link_id: &str) -> Result<Vec<Review>, ApiError> {
        let Some(link_id) = parse_id(link_id) else {
            return Ok(Vec::new());
        };
        let models = reviews::Entity::find()
            .filter(reviews::Column::LinkId.eq(link_id))
            .all(&self.db)
            .await
            .context("list reviews for link")?;
        Ok(models.into_iter().map(Review::from).collect())
    }

    async fn list_with_links(&self) -> Result<Vec<ReviewWithLink>, ApiError> {
        let rows = reviews::Entity::find()
            .find_also_related(links::Entity)
            .all(&self.db)
            .await
            .context("list reviews with links")?;
        let mut joined: Vec<ReviewWithLink> = rows
            .into_iter()
            .filter_map(|(review, link)| {
                let link = link?;
                Some(ReviewWithLink {
                    link: LinkSummary {
                        name: link.name,
                        movie_id: link.movie_id,
                        is_public: link.is_public,
                        url: link.url,
                    },
                    review: review.into(),
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
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let model = reviews::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find review by id")?;
        Ok(model.map(Review::from))
    }

    async fn exists_for(&self, link_id: &str, username: &str) -> Result<bool, ApiError> {
        let Some(link_id) = parse_id(link_id) else {
            return Ok(false);
        };
        let count = reviews::Entity::find()
            .filter(reviews::Column::LinkId.eq(link_id))
            .filter(reviews::Column::Username.eq(username))
            .count(&self.db)
            .await
            .context("count reviews for link and user")?;
        Ok(count > 0)
    }

    async fn create(&self, review: NewReview) -> Result<Review, ApiError> {
        let Some(link_id) = parse_id(&review.link_id) else {
            return Err(ApiError::LinkNotFound);
        };
        // The unique index on (link_id, username) backstops the use-case
        // pre-check against concurrent duplicate submissions.
        if self.exists_for(&review.link_id, &review.username).await? {
            return Err(ApiError::DuplicateReview);
        }
        let model = reviews::ActiveModel {
            id: Set(Uuid::new_v4()),
            link_id: Set(link_id),
            username: Set(review.username),
            rating: Set(i16::from(review.rating)),
            comment: Set(review.comment),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert review")?;
        Ok(model.into())
    }

    async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let result = reviews::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete review")?;
        Ok(result.rows_affected > 0)
    }

    async fn average_rating(&self, link_id: &str) -> Result<Option<f64>, ApiError> {
        let Some(link_id) = parse_id(link_id) else {
            return Ok(None);
        };
        let ratings: Vec<i16> = reviews::Entity::find()
            .filter(reviews::Column::LinkId.eq(link_id))
            .all(&self.db)
            .await
            .context("list ratings for average")?
            .into_iter()
            .map(|r| r.rating)
            .collect();
        Ok(average(&ratings))
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(reviews::Entity::find()
            .count(&self.db)
            .await
            .context("count reviews")?)
    }
}

// ── Favorite repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbFavoriteRepository {
    pub db: DatabaseConnection,
}

impl FavoriteRepository for DbFavoriteRepository {
    async fn list(&self, username: &str) -> Result<Vec<Favorite>, ApiError> {
        let models = favorites::Entity::find()
            .filter(favorites::Column::Username.eq(username))
            .all(&self.db)
            .await
            .context("list favorites")?;
        Ok(models
            .into_iter()
            .map(|m| Favorite {
                movie_id: m.movie_id,
                added_date: m.added_date,
            })
            .collect())
    }

    async fn contains(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        let count = favorites::Entity::find_by_id((username.to_owned(), movie_id.to_owned()))
            .count(&self.db)
            .await
            .context("check favorite")?;
        Ok(count > 0)
    }

    async fn add(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        if self.contains(username, movie_id).await? {
            return Ok(false);
        }
        favorites::ActiveModel {
            username: Set(username.to_owned()),
            movie_id: Set(movie_id.to_owned()),
            added_date: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("insert favorite")?;
        Ok(true)
    }

    async fn remove(&self, username: &str, movie_id: &str) -> Result<bool, ApiError> {
        let result =
            favorites::Entity::delete_by_id((username.to_owned(), movie_id.to_owned()))
                .exec(&self.db)
                .await
                .context("delete favorite")?;
        Ok(result.rows_affected > 0)
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(favorites::Entity::find()
            .count(&self.db)
            .await
            .context("count favorites")?)
    }
}
