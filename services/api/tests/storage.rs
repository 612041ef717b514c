//! Backend-parity tests: the same scenarios run against the database backend
//! (in-memory sqlite) and the flat-file backend, through the same store
//! surface the service uses, and must observe identical behavior.

use sea_orm_migration::MigratorTrait;

use cinelink_api::domain::repository::{
    FavoriteRepository, LinkRepository, ReviewRepository, UserRepository,
};
use cinelink_api::domain::types::{NewLink, NewReview, NewUser};
use cinelink_api::error::ApiError;
use cinelink_api::infra::jsondb::JsonDb;
use cinelink_api::infra::store::Stores;
use cinelink_domain::user::UserRole;
use cinelink_migration::Migrator;

async fn db_stores() -> Stores {
    // One pooled connection so every query sees the same in-memory database.
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let conn = sea_orm::Database::connect(options).await.unwrap();
    Migrator::up(&conn, None).await.unwrap();
    Stores::database(conn)
}

async fn json_stores() -> (tempfile::TempDir, Stores) {
    let dir = tempfile::tempdir().unwrap();
    let db = JsonDb::open(dir.path()).await.unwrap();
    (dir, Stores::json(db))
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser {
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash: "$argon2id$test".to_owned(),
        role: UserRole::User,
    }
}

fn new_link(username: &str, movie_id: &str) -> NewLink {
    NewLink {
        name: "Site".to_owned(),
        description: String::new(),
        url: "https://x.com".to_owned(),
        username: username.to_owned(),
        movie_id: movie_id.to_owned(),
        is_public: true,
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

/// Deleting a user removes their links, their reviews, anyone's reviews on
/// their links, and their favorites — and nobody else's data.
async fn assert_user_cascade(stores: &Stores) {
    let alice = stores.users.create(new_user("alice", "a@x.com")).await.unwrap();
    stores.users.create(new_user("bob", "b@x.com")).await.unwrap();

    let alice_link = stores.links.create(new_link("alice", "tt001")).await.unwrap();
    let bob_link = stores.links.create(new_link("bob", "tt002")).await.unwrap();
    stores
        .reviews
        .create(new_review(&bob_link.id, "alice", 3))
        .await
        .unwrap();
    stores
        .reviews
        .create(new_review(&alice_link.id, "bob", 5))
        .await
        .unwrap();
    stores.favorites.add("alice", "tt001").await.unwrap();
    stores.favorites.add("bob", "tt002").await.unwrap();

    assert!(stores.users.delete_cascade(&alice.id).await.unwrap());

    assert!(stores.users.find_by_username("alice").await.unwrap().is_none());
    assert!(stores.users.find_by_username("bob").await.unwrap().is_some());
    assert!(stores.links.find_by_id(&alice_link.id).await.unwrap().is_none());
    assert!(stores.links.find_by_id(&bob_link.id).await.unwrap().is_some());
    // Alice's authored review AND bob's review on her link are both gone.
    assert!(
        stores
            .reviews
            .list_for_link(&alice_link.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(stores.reviews.count().await.unwrap(), 0);
    assert!(stores.favorites.list("alice").await.unwrap().is_empty());
    assert_eq!(stores.favorites.list("bob").await.unwrap().len(), 1);
}

/// The average of zero reviews is `None`, never zero.
async fn assert_average_none_then_mean(stores: &Stores) {
    stores.users.create(new_user("alice", "a@x.com")).await.unwrap();
    let link = stores.links.create(new_link("alice", "tt001")).await.unwrap();
    assert_eq!(stores.reviews.average_rating(&link.id).await.unwrap(), None);

    stores
        .reviews
        .create(new_review(&link.id, "alice", 4))
        .await
        .unwrap();
    stores
        .reviews
        .create(new_review(&link.id, "bob", 2))
        .await
        .unwrap();
    assert_eq!(
        stores.reviews.average_rating(&link.id).await.unwrap(),
        Some(3.0)
    );
}

/// A second review by the same user on the same link conflicts and leaves
/// the original untouched.
async fn assert_duplicate_review_rejected(stores: &Stores) {
    stores.users.create(new_user("alice", "a@x.com")).await.unwrap();
    let link = stores.links.create(new_link("alice", "tt001")).await.unwrap();
    stores
        .reviews
        .create(new_review(&link.id, "alice", 4))
        .await
        .unwrap();

    let result = stores.reviews.create(new_review(&link.id, "alice", 1)).await;
    assert!(matches!(result, Err(ApiError::DuplicateReview)));
    assert_eq!(
        stores.reviews.average_rating(&link.id).await.unwrap(),
        Some(4.0)
    );
}

#[tokio::test]
async fn should_cascade_user_delete_on_database_backend() {
    assert_user_cascade(&db_stores().await).await;
}

#[tokio::test]
async fn should_cascade_user_delete_on_file_backend() {
    let (_dir, stores) = json_stores().await;
    assert_user_cascade(&stores).await;
}

#[tokio::test]
async fn should_average_none_then_mean_on_database_backend() {
    assert_average_none_then_mean(&db_stores().await).await;
}

#[tokio::test]
async fn should_average_none_then_mean_on_file_backend() {
    let (_dir, stores) = json_stores().await;
    assert_average_none_then_mean(&stores).await;
}

#[tokio::test]
async fn should_reject_duplicate_review_on_database_backend() {
    assert_duplicate_review_rejected(&db_stores().await).await;
}

#[tokio::test]
async fn should_reject_duplicate_review_on_file_backend() {
    let (_dir, stores) = json_stores().await;
    assert_duplicate_review_rejected(&stores).await;
}
