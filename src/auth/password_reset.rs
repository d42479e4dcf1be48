use rusqlite::{params, OptionalExtension};

use crate::auth::session::generate_token;
use crate::db::models::UserId;
use crate::db::RepositoryError;
use crate::state::DbPool;

/// Store a single-use reset token for `user_id`, valid for `minutes`.
pub fn issue_reset_token(
    pool: &DbPool,
    user_id: UserId,
    minutes: u64,
) -> Result<String, RepositoryError> {
    let conn = pool.get()?;
    let token = generate_token();

    conn.execute(
        "INSERT INTO password_resets (token, user_id, expires_at)
         VALUES (?1, ?2, datetime('now', ?3))",
        params![token, user_id, format!("+{} minutes", minutes)],
    )?;

    Ok(token)
}

/// Redeem a reset token. The row is removed whether or not it was still
/// valid, so a token can never be used twice.
pub fn consume_reset_token(pool: &DbPool, token: &str) -> Result<Option<UserId>, RepositoryError> {
    let conn = pool.get()?;
    let user_id = conn
        .query_row(
            "DELETE FROM password_resets WHERE token = ?1
             RETURNING user_id, expires_at > datetime('now')",
            params![token],
            |row| Ok((row.get::<_, UserId>(0)?, row.get::<_, bool>(1)?)),
        )
        .optional()?
        .and_then(|(user_id, still_valid)| still_valid.then_some(user_id));
    Ok(user_id)
}
