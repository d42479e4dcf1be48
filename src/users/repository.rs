// Repository pattern - isolates all user database side effects
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, ErrorCode, OptionalExtension, Row};
use std::sync::Arc;

use crate::db::batch::{align_to_keys, dedup_keys};
use crate::db::models::{User, UserId};
use crate::db::{now_millis, RepositoryError};
use crate::state::DbPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Column named by a UNIQUE violation, e.g. "email" for
/// "UNIQUE constraint failed: users.email".
fn unique_violation(err: &rusqlite::Error) -> Option<String> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains("UNIQUE") =>
        {
            let column = msg.rsplit('.').next().unwrap_or("username");
            Some(column.trim().to_string())
        }
        _ => None,
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A duplicate username or email is reported as
    /// `RepositoryError::Conflict` naming the offending column.
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// One batched lookup; one slot per id, in id order.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<Option<User>>, RepositoryError>;

    async fn set_password(&self, id: UserId, password_hash: &str)
        -> Result<bool, RepositoryError>;
}

pub type DynUserRepository = Arc<dyn UserRepository>;

/// SQLite implementation
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn find_where(
        &self,
        clause: &str,
        value: &dyn rusqlite::ToSql,
    ) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = ?1"),
                [value],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;
        let now = now_millis();

        let result = conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![username, email, password_hash, now],
        );
        if let Err(e) = result {
            return Err(match unique_violation(&e) {
                Some(column) => RepositoryError::Conflict(column),
                None => e.into(),
            });
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.find_where("id", &id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.find_where("username", &username)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.find_where("email", &email)
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<Option<User>>, RepositoryError> {
        let distinct = dedup_keys(ids);
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; distinct.len()].join(", ");
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id IN ({placeholders})"
        ))?;
        let users = stmt
            .query_map(params_from_iter(distinct.iter()), user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(align_to_keys(ids, users, |user| user.id))
    }

    async fn set_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![password_hash, now_millis(), id],
        )?;
        Ok(rows > 0)
    }
}
