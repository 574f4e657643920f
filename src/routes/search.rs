use askama::Template;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::db::models::UserSummary;
use crate::db::search;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub username: String,
    pub profile_image: Option<String>,
    pub query: Option<String>,
    pub friends: Vec<UserSummary>,
    pub history: Vec<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteSearchForm {
    pub search_query: String,
}

/// GET /search_friends: substring search over usernames. A non-empty
/// query is recorded in the caller's deduplicated history.
pub async fn search_friends(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    let query = params.query.filter(|q| !q.is_empty());

    let friends = search::search_users(&state.db, query.as_deref())?;
    if let Some(q) = &query {
        search::record_query(&state.db, &user.username, q)?;
    }
    let history = search::recent_history(&state.db, &user.username)?;

    Ok(Html(SearchTemplate {
        username: user.username,
        profile_image: user.profile_image,
        query,
        friends,
        history,
    })
    .into_response())
}

/// POST /delete_search: drop one remembered query and return to the
/// search page.
pub async fn delete_search(
    State(state): State<AppState>,
    user: CurrentUser,
    axum::Form(form): axum::Form<DeleteSearchForm>,
) -> AppResult<Response> {
    search::delete_history_entry(&state.db, &user.username, &form.search_query)?;
    Ok(Redirect::to("/search_friends").into_response())
}
