use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use rusqlite::params;

use crate::error::AppError;
use crate::state::AppState;

/// The raw session token from the cookie, if the browser sent one.
/// Says nothing about whether the session exists or is signed in.
pub struct SessionToken(pub Option<String>);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(
            cookie_value(parts, &state.config.auth.cookie_name).map(|v| v.to_string()),
        ))
    }
}

/// The currently authenticated user: a live session row with a bound
/// username. This is the guard on every gated page; rejection redirects
/// to the login form.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
    pub profile_image: Option<String>,
    /// The session token, so handlers can record redirect targets and
    /// flash messages against the same session.
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(parts, &state.config.auth.cookie_name)
            .ok_or(AppError::Unauthenticated)?
            .to_string();

        let conn = state.db.get()?;
        conn.query_row(
            "SELECT u.username, u.profile_image FROM sessions s \
             JOIN users u ON u.username = s.username \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(CurrentUser {
                    username: row.get(0)?,
                    profile_image: row.get(1)?,
                    token: token.clone(),
                })
            },
        )
        .map_err(|_| AppError::Unauthenticated)
    }
}

/// Optional user extractor — returns None instead of redirecting when
/// not authenticated. Used on public pages that still personalize for
/// signed-in viewers.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(_) => Ok(MaybeUser(None)),
        }
    }
}

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(value: &str) -> Parts {
        let request = Request::builder()
            .header(header::COOKIE, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn cookie_value_finds_the_named_cookie() {
        let parts = parts_with_cookie("other=1; mingle_session=abc123; theme=dark");
        assert_eq!(cookie_value(&parts, "mingle_session"), Some("abc123"));
    }

    #[test]
    fn cookie_value_is_none_when_absent() {
        let parts = parts_with_cookie("other=1");
        assert_eq!(cookie_value(&parts, "mingle_session"), None);
    }
}
