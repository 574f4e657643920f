//! Server-side session rows. The browser cookie carries only the random
//! token; the bound username, the single-use previous-URL value, and the
//! one-shot flash message live in the `sessions` table.

use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::error::AppResult;
use crate::state::DbPool;

/// Create a new anonymous session. Returns the session token.
pub fn create_session(pool: &DbPool, hours: u64) -> AppResult<String> {
    let conn = pool.get()?;
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, token, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Reuse the caller's live session or create a fresh one. Returns the
/// token to set as the cookie value.
pub fn ensure_session(pool: &DbPool, existing: Option<&str>, hours: u64) -> AppResult<String> {
    if let Some(token) = existing {
        let conn = pool.get()?;
        let live: Option<String> = conn
            .query_row(
                "SELECT token FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
                params![token],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(token) = live {
            return Ok(token);
        }
    }
    create_session(pool, hours)
}

/// Bind an authenticated username to a session.
pub fn bind_username(pool: &DbPool, token: &str, username: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE sessions SET username = ?1 WHERE token = ?2",
        params![username, token],
    )?;
    Ok(())
}

/// Clear the session-bound username. Idempotent; the session row (and
/// its cookie) survive for flash messages and future logins.
pub fn unbind_username(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE sessions SET username = NULL WHERE token = ?1",
        params![token],
    )?;
    Ok(())
}

/// Record the page a mutating action should return to.
pub fn remember_page(pool: &DbPool, token: &str, url: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE sessions SET previous_url = ?1 WHERE token = ?2",
        params![url, token],
    )?;
    Ok(())
}

/// Consume the remembered previous URL, if any. Single-use: a second
/// call returns `None` until a page records a new value.
pub fn take_previous_url(pool: &DbPool, token: &str) -> AppResult<Option<String>> {
    let conn = pool.get()?;
    let url: Option<Option<String>> = conn
        .query_row(
            "SELECT previous_url FROM sessions WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    conn.execute(
        "UPDATE sessions SET previous_url = NULL WHERE token = ?1",
        params![token],
    )?;
    Ok(url.flatten())
}

/// Where a completed mutation should send the browser: the remembered
/// previous URL when one exists, the home feed otherwise.
pub fn pop_destination(pool: &DbPool, token: Option<&str>) -> AppResult<String> {
    if let Some(token) = token {
        if let Some(url) = take_previous_url(pool, token)? {
            return Ok(url);
        }
    }
    Ok("/".to_string())
}

/// Store a one-shot message shown on the next page render.
pub fn set_flash(pool: &DbPool, token: &str, message: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE sessions SET flash = ?1 WHERE token = ?2",
        params![message, token],
    )?;
    Ok(())
}

/// Consume the pending flash message, if any.
pub fn take_flash(pool: &DbPool, token: &str) -> AppResult<Option<String>> {
    let conn = pool.get()?;
    let flash: Option<Option<String>> = conn
        .query_row(
            "SELECT flash FROM sessions WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    conn.execute(
        "UPDATE sessions SET flash = NULL WHERE token = ?1",
        params![token],
    )?;
    Ok(flash.flatten())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn ensure_session_reuses_a_live_token() {
        let pool = test_pool();
        let token = create_session(&pool, 1).unwrap();
        assert_eq!(ensure_session(&pool, Some(&token), 1).unwrap(), token);
    }

    #[test]
    fn ensure_session_replaces_an_unknown_token() {
        let pool = test_pool();
        let token = ensure_session(&pool, Some("stale"), 1).unwrap();
        assert_ne!(token, "stale");
    }

    #[test]
    fn bind_and_unbind_username() {
        let pool = test_pool();
        let token = create_session(&pool, 1).unwrap();
        bind_username(&pool, &token, "alice").unwrap();

        let conn = pool.get().unwrap();
        let bound: Option<String> = conn
            .query_row(
                "SELECT username FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(bound.as_deref(), Some("alice"));
        drop(conn);

        unbind_username(&pool, &token).unwrap();
        unbind_username(&pool, &token).unwrap(); // idempotent

        let conn = pool.get().unwrap();
        let bound: Option<String> = conn
            .query_row(
                "SELECT username FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(bound, None);
    }

    #[test]
    fn previous_url_is_consumed_exactly_once() {
        let pool = test_pool();
        let token = create_session(&pool, 1).unwrap();
        remember_page(&pool, &token, "/post/7").unwrap();

        assert_eq!(
            pop_destination(&pool, Some(&token)).unwrap(),
            "/post/7".to_string()
        );
        // A retried mutation falls back to the home feed.
        assert_eq!(pop_destination(&pool, Some(&token)).unwrap(), "/");
    }

    #[test]
    fn pop_destination_without_a_session_falls_back_home() {
        let pool = test_pool();
        assert_eq!(pop_destination(&pool, None).unwrap(), "/");
    }

    #[test]
    fn flash_is_consumed_exactly_once() {
        let pool = test_pool();
        let token = create_session(&pool, 1).unwrap();
        set_flash(&pool, &token, "Account created.").unwrap();

        assert_eq!(
            take_flash(&pool, &token).unwrap().as_deref(),
            Some("Account created.")
        );
        assert_eq!(take_flash(&pool, &token).unwrap(), None);
    }
}
