use rusqlite::{params, OptionalExtension};

use crate::db::models::{User, UserLink, UserSummary};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Register a new user. The password is stored only as a bcrypt hash;
/// a taken username surfaces as `DuplicateUsername`.
pub fn create_user(pool: &DbPool, username: &str, password: &str) -> AppResult<()> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO users (username, password) VALUES (?1, ?2)",
        params![username, hash],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateUsername
        } else {
            e.into()
        }
    })?;
    Ok(())
}

/// Check a username/password pair. `UserNotFound` and
/// `InvalidCredential` are advisory outcomes for the login form, not
/// HTTP errors.
pub fn verify_login(pool: &DbPool, username: &str, password: &str) -> AppResult<()> {
    let conn = pool.get()?;
    let hash: Option<String> = conn
        .query_row(
            "SELECT password FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    let hash = hash.ok_or(AppError::UserNotFound)?;
    if bcrypt::verify(password, &hash)? {
        Ok(())
    } else {
        Err(AppError::InvalidCredential)
    }
}

pub fn get_user(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT username, password, profile_image, phone, country, birthdate, about, created_at \
         FROM users WHERE username = ?1",
        params![username],
        |row| {
            Ok(User {
                username: row.get(0)?,
                password: row.get(1)?,
                profile_image: row.get(2)?,
                phone: row.get(3)?,
                country: row.get(4)?,
                birthdate: row.get(5)?,
                about: row.get(6)?,
                created_at: row.get(7)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

pub fn links_for(pool: &DbPool, username: &str) -> AppResult<Vec<UserLink>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, username, label, url FROM user_links WHERE username = ?1 ORDER BY id",
    )?;
    let links = stmt
        .query_map(params![username], |row| {
            Ok(UserLink {
                id: row.get(0)?,
                username: row.get(1)?,
                label: row.get(2)?,
                url: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(links)
}

pub fn all_users(pool: &DbPool) -> AppResult<Vec<UserSummary>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT username, profile_image FROM users")?;
    let users = stmt
        .query_map([], |row| {
            Ok(UserSummary {
                username: row.get(0)?,
                profile_image: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Extended profile fields submitted from the profile form.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub birthdate: Option<String>,
    pub about: Option<String>,
    /// Sanitized filename of a newly uploaded image; `None` keeps the
    /// stored reference.
    pub profile_image: Option<String>,
}

/// Update a user's profile. A username rename propagates to owned
/// posts, comments, links, search history, and live sessions in one
/// transaction, so content never orphans from the renamed identity.
pub fn update_profile(pool: &DbPool, current: &str, update: &ProfileUpdate) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let updated = match &update.profile_image {
        Some(image) => tx.execute(
            "UPDATE users SET username = ?1, phone = ?2, country = ?3, birthdate = ?4, \
             about = ?5, profile_image = ?6 WHERE username = ?7",
            params![
                update.username,
                update.phone,
                update.country,
                update.birthdate,
                update.about,
                image,
                current
            ],
        ),
        None => tx.execute(
            "UPDATE users SET username = ?1, phone = ?2, country = ?3, birthdate = ?4, \
             about = ?5 WHERE username = ?6",
            params![
                update.username,
                update.phone,
                update.country,
                update.birthdate,
                update.about,
                current
            ],
        ),
    }
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateUsername
        } else {
            AppError::from(e)
        }
    })?;

    if updated == 0 {
        return Err(AppError::UserNotFound);
    }

    if update.username != current {
        for table in ["posts", "comments", "user_links", "search_history", "sessions"] {
            tx.execute(
                &format!("UPDATE {} SET username = ?1 WHERE username = ?2", table),
                params![update.username, current],
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
