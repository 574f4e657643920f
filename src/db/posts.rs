use rusqlite::{params, OptionalExtension};

use crate::db::models::{FeedPost, Post};
use crate::error::{AppError, AppResult};
use crate::media;
use crate::state::DbPool;

/// Outcome of an edit request. A payload without a content field is a
/// no-op guard, not an error: the caller redirects back unchanged.
#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    Unchanged,
}

/// Insert a post. The kind tag is derived from the media filename at
/// write time; both content and media are optional and empty posts are
/// permitted.
pub fn create_post(
    pool: &DbPool,
    author: &str,
    content: Option<&str>,
    media: Option<&str>,
) -> AppResult<i64> {
    let kind = media::classify(media);
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO posts (username, content, media, kind) VALUES (?1, ?2, ?3, ?4)",
        params![author, content, media, kind.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update a post's content and, when a new upload is supplied, its
/// media. The kind is re-derived from whichever media reference ends up
/// stored; prior media is retained when no new file arrives.
pub fn edit_post(
    pool: &DbPool,
    id: i64,
    content: Option<&str>,
    new_media: Option<&str>,
) -> AppResult<EditOutcome> {
    let existing = get_raw(pool, id)?.ok_or(AppError::PostNotFound)?;

    let Some(content) = content else {
        return Ok(EditOutcome::Unchanged);
    };

    let media = new_media.map(|m| m.to_string()).or(existing.media);
    let kind = media::classify(media.as_deref());

    let conn = pool.get()?;
    conn.execute(
        "UPDATE posts SET content = ?1, media = ?2, kind = ?3 WHERE id = ?4",
        params![content, media, kind.as_str(), id],
    )?;
    Ok(EditOutcome::Updated)
}

/// Unconditional delete: no existence or ownership check. Comments on
/// the post go with it via the cascade.
pub fn delete_post(pool: &DbPool, id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(())
}

const FEED_SELECT: &str = "SELECT p.id, p.username, p.content, p.media, p.kind, p.timestamp, \
     u.profile_image, u.about, u.phone, u.country, u.birthdate \
     FROM posts p JOIN users u ON u.username = p.username";

fn feed_post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeedPost> {
    Ok(FeedPost {
        id: row.get(0)?,
        username: row.get(1)?,
        content: row.get(2)?,
        media: row.get(3)?,
        kind: row.get(4)?,
        timestamp: row.get(5)?,
        profile_image: row.get(6)?,
        about: row.get(7)?,
        phone: row.get(8)?,
        country: row.get(9)?,
        birthdate: row.get(10)?,
    })
}

/// All posts joined with their author's profile fields, newest first.
pub fn feed(pool: &DbPool) -> AppResult<Vec<FeedPost>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY p.timestamp DESC, p.id DESC",
        FEED_SELECT
    ))?;
    let posts = stmt
        .query_map([], feed_post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// One post with the author join, or `PostNotFound`.
pub fn get_post(pool: &DbPool, id: i64) -> AppResult<FeedPost> {
    let conn = pool.get()?;
    conn.query_row(
        &format!("{} WHERE p.id = ?1", FEED_SELECT),
        params![id],
        feed_post_from_row,
    )
    .optional()?
    .ok_or(AppError::PostNotFound)
}

/// A user's own posts for the public profile page, newest first.
pub fn posts_by(pool: &DbPool, username: &str) -> AppResult<Vec<Post>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, username, content, media, kind, timestamp FROM posts \
         WHERE username = ?1 ORDER BY timestamp DESC, id DESC",
    )?;
    let posts = stmt
        .query_map(params![username], |row| {
            Ok(Post {
                id: row.get(0)?,
                username: row.get(1)?,
                content: row.get(2)?,
                media: row.get(3)?,
                kind: row.get(4)?,
                timestamp: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

fn get_raw(pool: &DbPool, id: i64) -> AppResult<Option<Post>> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT id, username, content, media, kind, timestamp FROM posts WHERE id = ?1",
        params![id],
        |row| {
            Ok(Post {
                id: row.get(0)?,
                username: row.get(1)?,
                content: row.get(2)?,
                media: row.get(3)?,
                kind: row.get(4)?,
                timestamp: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Fetch a post without the author join, for the edit form.
pub fn get_post_for_edit(pool: &DbPool, id: i64) -> AppResult<Post> {
    get_raw(pool, id)?.ok_or(AppError::PostNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::users::create_user;

    fn seed_user(pool: &DbPool, name: &str) {
        create_user(pool, name, "pw").unwrap();
    }

    #[test]
    fn kind_is_derived_from_the_media_extension() {
        let pool = test_pool();
        seed_user(&pool, "alice");

        let image = create_post(&pool, "alice", Some("look"), Some("photo.png")).unwrap();
        let video = create_post(&pool, "alice", None, Some("clip.mp4")).unwrap();
        let text = create_post(&pool, "alice", Some("hello"), None).unwrap();

        assert_eq!(get_post(&pool, image).unwrap().kind, "image");
        assert_eq!(get_post(&pool, video).unwrap().kind, "video");
        assert_eq!(get_post(&pool, text).unwrap().kind, "text");
    }

    #[test]
    fn attaching_an_unknown_file_type_stays_text() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", Some("notes"), Some("notes.pdf")).unwrap();
        assert_eq!(get_post(&pool, id).unwrap().kind, "text");
    }

    #[test]
    fn empty_posts_are_permitted() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", None, None).unwrap();
        let post = get_post(&pool, id).unwrap();
        assert_eq!(post.content, None);
        assert_eq!(post.kind, "text");
    }

    #[test]
    fn edit_without_a_content_field_changes_nothing() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", Some("before"), Some("photo.png")).unwrap();

        let outcome = edit_post(&pool, id, None, None).unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);

        let post = get_post(&pool, id).unwrap();
        assert_eq!(post.content.as_deref(), Some("before"));
        assert_eq!(post.media.as_deref(), Some("photo.png"));
        assert_eq!(post.kind, "image");
    }

    #[test]
    fn edit_keeps_prior_media_and_kind_without_a_new_upload() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", Some("before"), Some("clip.mp4")).unwrap();

        edit_post(&pool, id, Some("after"), None).unwrap();

        let post = get_post(&pool, id).unwrap();
        assert_eq!(post.content.as_deref(), Some("after"));
        assert_eq!(post.media.as_deref(), Some("clip.mp4"));
        assert_eq!(post.kind, "video");
    }

    #[test]
    fn edit_with_new_media_rederives_the_kind() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", Some("x"), Some("photo.png")).unwrap();

        edit_post(&pool, id, Some("x"), Some("clip.mov")).unwrap();
        assert_eq!(get_post(&pool, id).unwrap().kind, "video");
    }

    #[test]
    fn editing_a_missing_post_is_post_not_found() {
        let pool = test_pool();
        assert!(matches!(
            edit_post(&pool, 99, Some("x"), None),
            Err(AppError::PostNotFound)
        ));
        assert!(matches!(get_post(&pool, 99), Err(AppError::PostNotFound)));
    }

    #[test]
    fn delete_is_unconditional() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        let id = create_post(&pool, "alice", Some("bye"), None).unwrap();

        delete_post(&pool, id).unwrap();
        delete_post(&pool, id).unwrap(); // missing row is not an error

        assert!(matches!(get_post(&pool, id), Err(AppError::PostNotFound)));
    }

    #[test]
    fn feed_is_newest_first_with_author_fields_joined() {
        let pool = test_pool();
        seed_user(&pool, "alice");
        crate::db::users::update_profile(
            &pool,
            "alice",
            &crate::db::users::ProfileUpdate {
                username: "alice".into(),
                country: Some("NL".into()),
                profile_image: Some("alice.png".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO posts (username, content, kind, timestamp) \
             VALUES ('alice', 'old', 'text', '2026-01-01 10:00:00')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (username, content, kind, timestamp) \
             VALUES ('alice', 'new', 'text', '2026-01-02 10:00:00')",
            [],
        )
        .unwrap();
        drop(conn);

        let feed = feed(&pool).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].content.as_deref(), Some("new"));
        assert_eq!(feed[1].content.as_deref(), Some("old"));
        assert_eq!(feed[0].profile_image.as_deref(), Some("alice.png"));
        assert_eq!(feed[0].country.as_deref(), Some("NL"));
    }
}
