use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::session;
use crate::db::models::{CommentView, FeedPost};
use crate::db::{comments, posts};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub username: String,
    pub profile_image: Option<String>,
    pub posts: Vec<FeedPost>,
    pub comments: Vec<CommentView>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: the home feed. Every post with its author's profile fields,
/// newest first, plus the system-wide recent-comment preview.
pub async fn index(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    // Mutations launched from the feed return here.
    session::remember_page(&state.db, &user.token, "/")?;

    let posts = posts::feed(&state.db)?;
    let comments = comments::recent_comments(&state.db)?;

    Ok(Html(HomeTemplate {
        username: user.username,
        profile_image: user.profile_image,
        posts,
        comments,
    })
    .into_response())
}
