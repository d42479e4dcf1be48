use serde::{Deserialize, Serialize};

use crate::voting::VoteDirection;

pub type UserId = i64;
pub type PostId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub points: i64,
    pub creator_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One ledger row: a single user's current vote on a single post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: UserId,
    pub post_id: PostId,
    pub direction: VoteDirection,
}

/// Composite identity of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteKey {
    pub user_id: UserId,
    pub post_id: PostId,
}

impl VoteKey {
    pub fn new(user_id: UserId, post_id: PostId) -> Self {
        Self { user_id, post_id }
    }
}
