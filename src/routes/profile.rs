use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::session;
use crate::db::models::{Post, User, UserLink};
use crate::db::{posts, users};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::media;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub user: User,
    pub links: Vec<UserLink>,
    pub message: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/user.html")]
pub struct UserTemplate {
    pub user: User,
    pub posts: Vec<Post>,
    pub links: Vec<UserLink>,
}

#[derive(Template)]
#[template(path = "pages/user_not_found.html")]
pub struct UserNotFoundTemplate {
    pub username: String,
}

// -- Handlers --

/// GET /profile: the signed-in user's own profile and links.
pub async fn own_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let row = users::get_user(&state.db, &user.username)?
        .ok_or(crate::error::AppError::UserNotFound)?;
    let links = users::links_for(&state.db, &user.username)?;
    let message = session::take_flash(&state.db, &user.token)?;

    session::remember_page(&state.db, &user.token, "/profile")?;

    Ok(Html(ProfileTemplate {
        user: row,
        links,
        message,
    })
    .into_response())
}

/// POST /update_profile: multipart form with the extended profile
/// fields and an optional image. The image filename is sanitized before
/// it is stored; a username rename cascades and re-binds the session.
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut update = users::ProfileUpdate {
        username: user.username.clone(),
        ..Default::default()
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("username") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    update.username = value;
                }
            }
            Some("phone") => update.phone = non_empty(field.text().await?),
            Some("country") => update.country = non_empty(field.text().await?),
            Some("birthdate") => update.birthdate = non_empty(field.text().await?),
            Some("about") => update.about = non_empty(field.text().await?),
            Some("profile_image") => {
                let filename = field.file_name().map(|f| f.to_string());
                let data = field.bytes().await?;
                if let Some(sanitized) = filename.as_deref().and_then(media::sanitize_filename) {
                    if !data.is_empty() {
                        media::save_upload(state.config.uploads_path(), &sanitized, &data)?;
                        update.profile_image = Some(sanitized);
                    }
                }
            }
            _ => {}
        }
    }

    match users::update_profile(&state.db, &user.username, &update) {
        Ok(()) => {}
        Err(crate::error::AppError::DuplicateUsername) => {
            session::set_flash(&state.db, &user.token, "That username is already taken.")?;
            return Ok(Redirect::to("/profile").into_response());
        }
        Err(e) => return Err(e),
    }

    if update.username != user.username {
        tracing::info!("User {} renamed to {}", user.username, update.username);
    }

    Ok(Redirect::to("/profile").into_response())
}

/// GET /user/{username}: public profile view with the user's posts
/// and links; renders a not-found page for unknown names.
pub async fn view_user(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let Some(row) = users::get_user(&state.db, &username)? else {
        return Ok(Html(UserNotFoundTemplate { username }).into_response());
    };

    let posts = posts::posts_by(&state.db, &username)?;
    let links = users::links_for(&state.db, &username)?;

    // Signed-in viewers acting from this page come back to it.
    if let Some(viewer) = &viewer {
        session::remember_page(&state.db, &viewer.token, &format!("/user/{}", username))?;
    }

    Ok(Html(UserTemplate {
        user: row,
        posts,
        links,
    })
    .into_response())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
