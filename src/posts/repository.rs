// Repository pattern - isolates all post and ledger database side effects
use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, OptionalExtension, Row, TransactionBehavior};
use std::sync::Arc;

use crate::db::batch::{align_to_keys, dedup_keys};
use crate::db::models::{Post, PostId, UserId, Vote, VoteKey};
use crate::db::{now_millis, RepositoryError};
use crate::posts::domain::{PageRequest, PostView, VoteOutcome};
use crate::state::DbPool;
use crate::voting::{VoteDirection, VoteTransition};

const POST_COLUMNS: &str = "p.id, p.title, p.body, p.points, p.creator_id, p.created_at, p.updated_at";

impl ToSql for VoteDirection {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.value()))
    }
}

impl FromSql for VoteDirection {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i32::column_result(value)?;
        VoteDirection::try_from(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        text: row.get(2)?,
        points: row.get(3)?,
        creator_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Post storage and the paginated read path.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post owned by `creator_id` with zero points.
    async fn create(&self, creator_id: UserId, title: &str, text: &str)
        -> Result<Post, RepositoryError>;

    async fn find(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    /// Up to `request.fetch_size()` posts, newest first, strictly older than
    /// the cursor, each carrying `viewer`'s vote.
    async fn list(
        &self,
        request: &PageRequest,
        viewer: Option<UserId>,
    ) -> Result<Vec<PostView>, RepositoryError>;

    /// Rewrite title and body when `owner` created the post.
    async fn update_owned(
        &self,
        id: PostId,
        owner: UserId,
        title: &str,
        text: &str,
    ) -> Result<Option<Post>, RepositoryError>;

    /// Delete the post (and by cascade its ledger rows) when `owner`
    /// created it. Returns whether a row was removed.
    async fn delete_owned(&self, id: PostId, owner: UserId) -> Result<bool, RepositoryError>;
}

/// The vote ledger and the point aggregate it drives.
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Apply a vote atomically: the ledger row and the post's points move
    /// together or not at all.
    async fn apply(
        &self,
        key: VoteKey,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepositoryError>;

    /// One batched lookup; one slot per key, in key order.
    async fn find_many(&self, keys: &[VoteKey]) -> Result<Vec<Option<Vote>>, RepositoryError>;
}

pub type DynPostRepository = Arc<dyn PostRepository>;
pub type DynVoteRepository = Arc<dyn VoteRepository>;

/// SQLite implementation
pub struct SqlitePostRepository {
    pool: DbPool,
}

impl SqlitePostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn create(
        &self,
        creator_id: UserId,
        title: &str,
        text: &str,
    ) -> Result<Post, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Creation times are strictly increasing so the timestamp cursor
        // never lands between two posts sharing a millisecond.
        let latest: Option<i64> =
            tx.query_row("SELECT MAX(created_at) FROM posts", [], |row| row.get(0))?;
        let now = now_millis();
        let created_at = match latest {
            Some(latest) if latest >= now => latest + 1,
            _ => now,
        };

        tx.execute(
            "INSERT INTO posts (title, body, points, creator_id, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?4)",
            params![title, text, creator_id, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Post {
            id,
            title: title.to_string(),
            text: text.to_string(),
            points: 0,
            creator_id,
            created_at,
            updated_at: created_at,
        })
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn list(
        &self,
        request: &PageRequest,
        viewer: Option<UserId>,
    ) -> Result<Vec<PostView>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS},
                    (SELECT v.value FROM votes v WHERE v.user_id = ?2 AND v.post_id = p.id)
             FROM posts p
             WHERE (?3 IS NULL OR p.created_at < ?3)
             ORDER BY p.created_at DESC
             LIMIT ?1"
        ))?;

        let cursor = request.cursor.map(|c| c.millis());
        let rows = stmt
            .query_map(params![request.fetch_size(), viewer, cursor], |row| {
                Ok(PostView {
                    post: post_from_row(row)?,
                    vote_status: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    async fn update_owned(
        &self,
        id: PostId,
        owner: UserId,
        title: &str,
        text: &str,
    ) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                "UPDATE posts SET title = ?1, body = ?2, updated_at = ?3
                 WHERE id = ?4 AND creator_id = ?5
                 RETURNING id, title, body, points, creator_id, created_at, updated_at",
                params![title, text, now_millis(), id, owner],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn delete_owned(&self, id: PostId, owner: UserId) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute(
            "DELETE FROM posts WHERE id = ?1 AND creator_id = ?2",
            params![id, owner],
        )?;
        Ok(rows > 0)
    }
}

pub struct SqliteVoteRepository {
    pool: DbPool,
}

impl SqliteVoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepository {
    async fn apply(
        &self,
        key: VoteKey,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepositoryError> {
        let mut conn = self.pool.get()?;
        // IMMEDIATE takes the write lock before the ledger read, so two
        // concurrent votes on the same post cannot both plan from stale state.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let post_exists = tx
            .query_row(
                "SELECT 1 FROM posts WHERE id = ?1",
                params![key.post_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !post_exists {
            return Ok(VoteOutcome::PostNotFound);
        }

        let existing: Option<VoteDirection> = tx
            .query_row(
                "SELECT value FROM votes WHERE user_id = ?1 AND post_id = ?2",
                params![key.user_id, key.post_id],
                |row| row.get(0),
            )
            .optional()?;

        let transition = VoteTransition::plan(existing, direction);
        match transition {
            VoteTransition::Unchanged => return Ok(VoteOutcome::Unchanged),
            VoteTransition::Insert(direction) => {
                tx.execute(
                    "INSERT INTO votes (user_id, post_id, value) VALUES (?1, ?2, ?3)",
                    params![key.user_id, key.post_id, direction],
                )?;
            }
            VoteTransition::Flip(direction) => {
                tx.execute(
                    "UPDATE votes SET value = ?3 WHERE user_id = ?1 AND post_id = ?2",
                    params![key.user_id, key.post_id, direction],
                )?;
            }
        }

        let points_delta = transition.points_delta();
        tx.execute(
            "UPDATE posts SET points = points + ?1 WHERE id = ?2",
            params![points_delta, key.post_id],
        )?;
        tx.commit()?;

        Ok(VoteOutcome::Recorded { points_delta })
    }

    async fn find_many(&self, keys: &[VoteKey]) -> Result<Vec<Option<Vote>>, RepositoryError> {
        let distinct = dedup_keys(keys);
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["(?, ?)"; distinct.len()].join(", ");
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT user_id, post_id, value FROM votes
             WHERE (user_id, post_id) IN (VALUES {placeholders})"
        ))?;

        let bindings = distinct.iter().flat_map(|key| [key.user_id, key.post_id]);
        let rows = stmt
            .query_map(params_from_iter(bindings), |row| {
                Ok(Vote {
                    user_id: row.get(0)?,
                    post_id: row.get(1)?,
                    direction: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(align_to_keys(keys, rows, |vote| {
            VoteKey::new(vote.user_id, vote.post_id)
        }))
    }
}
