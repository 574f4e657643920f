use rusqlite::params;

use crate::db::models::UserSummary;
use crate::db::users;
use crate::error::AppResult;
use crate::state::DbPool;

/// Most recent queries returned per user.
const HISTORY_LIMIT: u32 = 10;

/// Substring search over usernames. An absent query lists every user.
pub fn search_users(pool: &DbPool, query: Option<&str>) -> AppResult<Vec<UserSummary>> {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return users::all_users(pool);
    };
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT username, profile_image FROM users WHERE username LIKE '%' || ?1 || '%'",
    )?;
    let matches = stmt
        .query_map(params![query], |row| {
            Ok(UserSummary {
                username: row.get(0)?,
                profile_image: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(matches)
}

/// Record a query in the user's history. The UNIQUE(username, query)
/// index makes this one atomic insert-if-absent; repeating a search
/// never duplicates a row.
pub fn record_query(pool: &DbPool, username: &str, query: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO search_history (username, search_query) VALUES (?1, ?2)",
        params![username, query],
    )?;
    Ok(())
}

/// Up to the 10 most recent query strings for a user, newest first.
pub fn recent_history(pool: &DbPool, username: &str) -> AppResult<Vec<String>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT search_query FROM search_history WHERE username = ?1 \
         ORDER BY timestamp DESC, id DESC LIMIT ?2",
    )?;
    let history = stmt
        .query_map(params![username, HISTORY_LIMIT], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(history)
}

/// Remove one remembered query; a no-op when the row is absent.
pub fn delete_history_entry(pool: &DbPool, username: &str, query: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "DELETE FROM search_history WHERE username = ?1 AND search_query = ?2",
        params![username, query],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::db::users::create_user;

    #[test]
    fn search_matches_substrings() {
        let pool = test_pool();
        for name in ["alice", "malice", "bob"] {
            create_user(&pool, name, "pw").unwrap();
        }

        let found: Vec<String> = search_users(&pool, Some("lice"))
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert!(found.contains(&"alice".to_string()));
        assert!(found.contains(&"malice".to_string()));
        assert!(!found.contains(&"bob".to_string()));
    }

    #[test]
    fn absent_query_lists_everyone() {
        let pool = test_pool();
        create_user(&pool, "alice", "pw").unwrap();
        create_user(&pool, "bob", "pw").unwrap();

        assert_eq!(search_users(&pool, None).unwrap().len(), 2);
        assert_eq!(search_users(&pool, Some("")).unwrap().len(), 2);
    }

    #[test]
    fn repeating_a_query_keeps_exactly_one_row() {
        let pool = test_pool();
        create_user(&pool, "alice", "pw").unwrap();

        record_query(&pool, "alice", "bob").unwrap();
        record_query(&pool, "alice", "bob").unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM search_history WHERE username = 'alice' \
                 AND search_query = 'bob'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn deleting_an_entry_removes_only_that_row() {
        let pool = test_pool();
        record_query(&pool, "alice", "bob").unwrap();
        record_query(&pool, "alice", "carol").unwrap();
        record_query(&pool, "dave", "bob").unwrap();

        delete_history_entry(&pool, "alice", "bob").unwrap();
        delete_history_entry(&pool, "alice", "bob").unwrap(); // no-op

        assert_eq!(recent_history(&pool, "alice").unwrap(), ["carol"]);
        assert_eq!(recent_history(&pool, "dave").unwrap(), ["bob"]);
    }

    #[test]
    fn history_returns_the_ten_newest_of_fifteen() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        for i in 0..15 {
            conn.execute(
                "INSERT INTO search_history (username, search_query, timestamp) \
                 VALUES ('alice', ?1, ?2)",
                params![format!("query-{}", i), format!("2026-01-01 10:00:{:02}", i)],
            )
            .unwrap();
        }
        drop(conn);

        let history = recent_history(&pool, "alice").unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0], "query-14");
        assert_eq!(history[9], "query-5");
    }
}
