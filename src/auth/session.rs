use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::db::models::UserId;
use crate::db::RepositoryError;
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: UserId, hours: u64) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    let token = generate_token();

    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![token, user_id, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Resolve a session token to its user, ignoring expired sessions.
pub fn lookup_session(pool: &DbPool, token: &str) -> Result<Option<UserId>, RepositoryError> {
    let conn = pool.get()?;
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), RepositoryError> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Value for a `Set-Cookie` header carrying the session token.
pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name,
        token,
        max_age_hours * 3600
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::TempDir;

    fn pool_with_user() -> (DbPool, UserId, TempDir) {
        let temp = TempDir::new().unwrap();
        let pool = db::create_pool(&temp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('alice', 'alice@example.com', 'h', 0, 0)",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        drop(conn);
        (pool, id, temp)
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn session_lifecycle() {
        let (pool, user_id, _temp) = pool_with_user();

        let token = create_session(&pool, user_id, 1).unwrap();
        assert_eq!(lookup_session(&pool, &token).unwrap(), Some(user_id));

        delete_session(&pool, &token).unwrap();
        assert_eq!(lookup_session(&pool, &token).unwrap(), None);
    }

    #[test]
    fn expired_sessions_are_ignored() {
        let (pool, user_id, _temp) = pool_with_user();
        let token = create_session(&pool, user_id, 1).unwrap();
        pool.get()
            .unwrap()
            .execute(
                "UPDATE sessions SET expires_at = datetime('now', '-1 hours') WHERE token = ?1",
                params![token],
            )
            .unwrap();

        assert_eq!(lookup_session(&pool, &token).unwrap(), None);
    }

    #[test]
    fn cookies_carry_name_token_and_lifetime() {
        let cookie = session_cookie("qid", "abc", 2);
        assert!(cookie.starts_with("qid=abc;"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(clear_session_cookie("qid").contains("Max-Age=0"));
    }
}
