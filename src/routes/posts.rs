use askama::Template;
use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::auth::session;
use crate::db::models::{Comment, CommentView, FeedPost, Post};
use crate::db::{comments, posts};
use crate::error::AppResult;
use crate::extractors::{CurrentUser, SessionToken};
use crate::media;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/create_post.html")]
pub struct CreatePostTemplate {
    pub username: String,
}

#[derive(Template)]
#[template(path = "pages/edit_post.html")]
pub struct EditPostTemplate {
    pub post: Post,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub username: String,
    pub profile_image: Option<String>,
    pub post: FeedPost,
    pub comments: Vec<CommentView>,
}

#[derive(Template)]
#[template(path = "pages/edit_comment.html")]
pub struct EditCommentTemplate {
    pub comment: Comment,
}

// -- Multipart parsing --

/// The fields of the post form: an optional content field and an
/// optional file upload. Tracks whether the content field appeared at
/// all, since an absent field makes an edit a no-op.
#[derive(Default)]
struct PostForm {
    content: Option<String>,
    media: Option<(String, Vec<u8>)>,
}

async fn read_post_form(mut multipart: Multipart) -> AppResult<PostForm> {
    let mut form = PostForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("post_content") => form.content = Some(field.text().await?),
            Some("media") => {
                let filename = field.file_name().map(|f| f.to_string());
                let data = field.bytes().await?;
                if let Some(basename) = filename.as_deref().and_then(media::original_basename) {
                    if !data.is_empty() {
                        form.media = Some((basename, data.to_vec()));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(form)
}

// -- Post handlers --

/// GET /create_post: render the new-post form.
pub async fn create_post_page(user: CurrentUser) -> Html<CreatePostTemplate> {
    Html(CreatePostTemplate {
        username: user.username,
    })
}

/// POST /create_post: persist any upload under its original basename,
/// derive the kind, insert, and return to the initiating page.
pub async fn create_post_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_post_form(multipart).await?;

    let media_name = match &form.media {
        Some((name, data)) => {
            media::save_upload(state.config.uploads_path(), name, data)?;
            Some(name.as_str())
        }
        None => None,
    };

    posts::create_post(&state.db, &user.username, form.content.as_deref(), media_name)?;

    let destination = session::pop_destination(&state.db, Some(&user.token))?;
    Ok(Redirect::to(&destination).into_response())
}

/// GET /edit_post/{id}: render the edit form, 404 when the post is
/// gone.
pub async fn edit_post_page(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = posts::get_post_for_edit(&state.db, id)?;
    Ok(Html(EditPostTemplate { post }).into_response())
}

/// POST /edit_post/{id}: a payload without a content field aborts the
/// edit and returns to the form; otherwise content is updated and new
/// media replaces the old reference.
pub async fn edit_post_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_post_form(multipart).await?;

    if form.content.is_none() {
        return Ok(Redirect::to(&format!("/edit_post/{}", id)).into_response());
    }

    let media_name = match &form.media {
        Some((name, data)) => {
            media::save_upload(state.config.uploads_path(), name, data)?;
            Some(name.as_str())
        }
        None => None,
    };

    posts::edit_post(&state.db, id, form.content.as_deref(), media_name)?;

    let destination = session::pop_destination(&state.db, Some(&user.token))?;
    Ok(Redirect::to(&destination).into_response())
}

/// POST /delete_post/{id}: unconditional delete; the session, when
/// present, only supplies the redirect-back target.
pub async fn delete_post(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    posts::delete_post(&state.db, id)?;
    let destination = session::pop_destination(&state.db, token.as_deref())?;
    Ok(Redirect::to(&destination).into_response())
}

/// GET /post/{id}: single post with its comments, oldest first.
pub async fn view_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = posts::get_post(&state.db, id)?;
    let comments = comments::comments_for_post(&state.db, id)?;

    session::remember_page(&state.db, &user.token, &format!("/post/{}", id))?;

    Ok(Html(PostTemplate {
        username: user.username,
        profile_image: user.profile_image,
        post,
        comments,
    })
    .into_response())
}

// -- Comment handlers --

#[derive(Deserialize)]
pub struct CommentForm {
    pub comment_content: String,
}

/// POST /add_comment/{id}: blank content is silently skipped; either
/// way the browser returns to the initiating page.
pub async fn add_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<i64>,
    axum::Form(form): axum::Form<CommentForm>,
) -> AppResult<Response> {
    comments::add_comment(&state.db, post_id, &user.username, &form.comment_content)?;
    let destination = session::pop_destination(&state.db, Some(&user.token))?;
    Ok(Redirect::to(&destination).into_response())
}

/// GET /edit_comment/{id}: render the edit form, 404 when the comment
/// is gone.
pub async fn edit_comment_page(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let comment = comments::get_comment(&state.db, id)?
        .ok_or(crate::error::AppError::CommentNotFound)?;
    Ok(Html(EditCommentTemplate { comment }).into_response())
}

/// POST /edit_comment/{id}: unconditional update, no ownership check.
pub async fn edit_comment_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    axum::Form(form): axum::Form<CommentForm>,
) -> AppResult<Response> {
    comments::edit_comment(&state.db, id, &form.comment_content)?;
    let destination = session::pop_destination(&state.db, Some(&user.token))?;
    Ok(Redirect::to(&destination).into_response())
}

/// POST /delete_comment/{id}: unconditional delete.
pub async fn delete_comment(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    comments::delete_comment(&state.db, id)?;
    let destination = session::pop_destination(&state.db, token.as_deref())?;
    Ok(Redirect::to(&destination).into_response())
}
