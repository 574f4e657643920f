use serde::Serialize;

/// Full user row. The username is the by-value key every other table
/// references; `password` holds the bcrypt hash and never leaves the
/// server.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub profile_image: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<String>,
    pub about: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub content: Option<String>,
    pub media: Option<String>,
    pub kind: String,
    pub timestamp: String,
}

impl Post {
    pub fn timestamp_display(&self) -> String {
        display_timestamp(&self.timestamp)
    }
}

/// A post joined with its author's profile fields, as listed on the
/// home feed and the single-post page.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub id: i64,
    pub username: String,
    pub content: Option<String>,
    pub media: Option<String>,
    pub kind: String,
    pub timestamp: String,
    pub profile_image: Option<String>,
    pub about: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<String>,
}

impl FeedPost {
    pub fn timestamp_display(&self) -> String {
        display_timestamp(&self.timestamp)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: String,
}

/// A comment joined with its author's profile image.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub content: String,
    pub timestamp: String,
    pub profile_image: Option<String>,
}

impl CommentView {
    pub fn timestamp_display(&self) -> String {
        display_timestamp(&self.timestamp)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserLink {
    pub id: i64,
    pub username: String,
    pub label: Option<String>,
    pub url: Option<String>,
}

/// Username + avatar pair returned by user search.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub profile_image: Option<String>,
}

/// SQLite stores `CURRENT_TIMESTAMP` as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn display_timestamp(ts: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.format("%b %-d, %Y %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_timestamp_formats_sqlite_datetimes() {
        assert_eq!(display_timestamp("2026-08-05 09:30:00"), "Aug 5, 2026 09:30");
    }

    #[test]
    fn display_timestamp_passes_through_unparseable_values() {
        assert_eq!(display_timestamp("yesterday"), "yesterday");
    }
}
