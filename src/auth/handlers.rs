use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::session;
use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::extractors::SessionToken;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub message: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub message: Option<String>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(state: &AppState, token: &str) -> String {
    let max_age_secs = state.config.auth.session_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        state.config.auth.cookie_name, token, max_age_secs
    )
}

// -- Handlers --

/// GET /login: render the login form, showing any pending flash
/// message (e.g. the signup confirmation).
pub async fn login_page(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> AppResult<Response> {
    let message = match token {
        Some(token) => session::take_flash(&state.db, &token)?,
        None => None,
    };
    Ok(Html(LoginTemplate { message }).into_response())
}

/// POST /login: verify credentials. Failures are advisory and
/// re-render the form; success binds the session and consumes any
/// pending previous-URL for the destination.
pub async fn login_submit(
    State(state): State<AppState>,
    SessionToken(existing): SessionToken,
    axum::Form(creds): axum::Form<Credentials>,
) -> AppResult<Response> {
    match users::verify_login(&state.db, &creds.username, &creds.password) {
        Ok(()) => {}
        Err(AppError::UserNotFound) => {
            return Ok(Html(LoginTemplate {
                message: Some("No account with that username.".into()),
            })
            .into_response());
        }
        Err(AppError::InvalidCredential) => {
            return Ok(Html(LoginTemplate {
                message: Some("Incorrect password.".into()),
            })
            .into_response());
        }
        Err(e) => return Err(e),
    }

    let hours = state.config.auth.session_hours;
    let token = session::ensure_session(&state.db, existing.as_deref(), hours)?;
    session::bind_username(&state.db, &token, &creds.username)?;
    let destination = session::pop_destination(&state.db, Some(&token))?;

    tracing::info!("User {} signed in", creds.username);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, destination),
            (header::SET_COOKIE, session_cookie(&state, &token)),
        ],
        "",
    )
        .into_response())
}

/// GET /logout: clear the session-bound username unconditionally and
/// return to the login form. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> AppResult<Response> {
    if let Some(token) = token {
        session::unbind_username(&state.db, &token)?;
    }
    Ok(axum::response::Redirect::to("/login").into_response())
}

/// GET /signup: render the registration form.
pub async fn signup_page() -> Html<SignupTemplate> {
    Html(SignupTemplate { message: None })
}

/// POST /signup: create the account and send the user to the login
/// form with a one-shot confirmation. A taken username re-renders the
/// form with an advisory message.
pub async fn signup_submit(
    State(state): State<AppState>,
    SessionToken(existing): SessionToken,
    axum::Form(creds): axum::Form<Credentials>,
) -> AppResult<Response> {
    match users::create_user(&state.db, &creds.username, &creds.password) {
        Ok(()) => {}
        Err(AppError::DuplicateUsername) => {
            return Ok(Html(SignupTemplate {
                message: Some("That username is already taken.".into()),
            })
            .into_response());
        }
        Err(e) => return Err(e),
    }

    let hours = state.config.auth.session_hours;
    let token = session::ensure_session(&state.db, existing.as_deref(), hours)?;
    session::set_flash(&state.db, &token, "Account created. You can sign in now.")?;

    tracing::info!("New user {} registered", creds.username);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/login".to_string()),
            (header::SET_COOKIE, session_cookie(&state, &token)),
        ],
        "",
    )
        .into_response())
}
