// Library exports for Mingle
// This allows integration tests and external code to use Mingle modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod media;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// The full HTTP surface, shared by the binary and the end-to-end
/// tests.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(routes::home::index))
        .route("/login", get(auth::handlers::login_page).post(auth::handlers::login_submit))
        .route("/logout", get(auth::handlers::logout))
        .route(
            "/signup",
            get(auth::handlers::signup_page).post(auth::handlers::signup_submit),
        )
        .route(
            "/create_post",
            get(routes::posts::create_post_page).post(routes::posts::create_post_submit),
        )
        .route(
            "/edit_post/{id}",
            get(routes::posts::edit_post_page).post(routes::posts::edit_post_submit),
        )
        .route("/delete_post/{id}", post(routes::posts::delete_post))
        .route("/add_comment/{id}", post(routes::posts::add_comment))
        .route("/post/{id}", get(routes::posts::view_post))
        .route(
            "/edit_comment/{id}",
            get(routes::posts::edit_comment_page).post(routes::posts::edit_comment_submit),
        )
        .route("/delete_comment/{id}", post(routes::posts::delete_comment))
        .route("/profile", get(routes::profile::own_profile))
        .route("/update_profile", post(routes::profile::update_profile))
        .route("/user/{username}", get(routes::profile::view_user))
        .route("/search_friends", get(routes::search::search_friends))
        .route("/delete_search", post(routes::search::delete_search))
        .route("/uploads/{filename}", get(routes::uploads::serve))
        .route("/assets/{*path}", get(routes::assets::serve))
}
