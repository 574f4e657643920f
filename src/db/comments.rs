use rusqlite::{params, OptionalExtension};

use crate::db::models::{Comment, CommentView};
use crate::error::AppResult;
use crate::state::DbPool;

/// Insert a comment. Whitespace-only content is silently skipped (the
/// handler redirects back without an error); returns whether a row was
/// written.
pub fn add_comment(pool: &DbPool, post_id: i64, author: &str, content: &str) -> AppResult<bool> {
    if content.trim().is_empty() {
        return Ok(false);
    }
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO comments (post_id, username, content) VALUES (?1, ?2, ?3)",
        params![post_id, author, content],
    )?;
    Ok(true)
}

pub fn get_comment(pool: &DbPool, id: i64) -> AppResult<Option<Comment>> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT id, post_id, username, content, timestamp FROM comments WHERE id = ?1",
        params![id],
        |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                username: row.get(2)?,
                content: row.get(3)?,
                timestamp: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Unconditional update; no ownership check.
pub fn edit_comment(pool: &DbPool, id: i64, content: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE comments SET content = ?1 WHERE id = ?2",
        params![content, id],
    )?;
    Ok(())
}

/// Unconditional delete; no ownership or existence check.
pub fn delete_comment(pool: &DbPool, id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(())
}

fn comment_view_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentView> {
    Ok(CommentView {
        id: row.get(0)?,
        post_id: row.get(1)?,
        username: row.get(2)?,
        content: row.get(3)?,
        timestamp: row.get(4)?,
        profile_image: row.get(5)?,
    })
}

/// Comments under one post, oldest first, as shown on the single-post
/// page.
pub fn comments_for_post(pool: &DbPool, post_id: i64) -> AppResult<Vec<CommentView>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.username, c.content, c.timestamp, u.profile_image \
         FROM comments c JOIN users u ON u.username = c.username \
         WHERE c.post_id = ?1 ORDER BY c.timestamp ASC, c.id ASC",
    )?;
    let comments = stmt
        .query_map(params![post_id], comment_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

/// Every comment system-wide, newest first. This is the home feed's
/// comment preview; its scope and ordering deliberately differ from
/// `comments_for_post`.
pub fn recent_comments(pool: &DbPool) -> AppResult<Vec<CommentView>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.username, c.content, c.timestamp, u.profile_image \
         FROM comments c JOIN users u ON u.username = c.username \
         ORDER BY c.timestamp DESC, c.id DESC",
    )?;
    let comments = stmt
        .query_map([], comment_view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}
