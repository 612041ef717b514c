use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth, favorites, health, links, movies, reviews};
use crate::middleware::{require_admin, require_session};
use crate::state::AppState;
use crate::telemetry::MakeUuidRequestId;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        // Health
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let session = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Links (the path parameter is a movie id for GET/PUT, a link id for DELETE)
        .route(
            "/links/{id}",
            get(links::get_movie_links)
                .put(links::upsert_link)
                .delete(links::delete_link),
        )
        .route("/links/by-id/{id}", get(links::get_link))
        .route("/top-links", get(links::top_links))
        // Reviews
        .route("/reviews", post(reviews::add_review))
        .route(
            "/reviews/{id}",
            get(reviews::get_link_reviews).delete(reviews::delete_review),
        )
        // Favorites
        .route(
            "/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route(
            "/favorites/{movie_id}",
            get(favorites::contains_favorite).delete(favorites::remove_favorite),
        )
        // External movie catalog
        .route("/movies/search", get(movies::search_movies))
        .route("/movies/{imdb_id}", get(movies::get_movie))
        .route("/movies/{imdb_id}/trailer", get(movies::get_trailer))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let admin = Router::new()
        .route("/stats", get(admin::stats))
        .route("/backend", get(admin::backend))
        .route("/backend/toggle", post(admin::toggle_backend))
        .route("/apis", get(admin::api_status))
        .route("/config", get(admin::config))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            delete(admin::delete_user).patch(admin::update_user),
        )
        .route("/links", get(admin::list_links))
        .route("/links/{id}", delete(admin::delete_link))
        .route("/reviews", get(admin::list_reviews))
        .route("/reviews/{id}", delete(admin::delete_review))
        // require_session runs first (outer), then the admin check.
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    public
        .merge(session)
        .nest("/admin", admin)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeUuidRequestId))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
