use crate::db::models::{Post, PostId, UserId, VoteKey};
use crate::error::{AppError, AppResult};
use crate::posts::domain::{Cursor, PageRequest, PostPage, VoteOutcome};
use crate::posts::repository::{DynPostRepository, DynVoteRepository};
use crate::voting::VoteDirection;

/// Application operations over posts and the vote ledger. Authorization
/// lives here; storage lives behind the repositories.
#[derive(Clone)]
pub struct PostService {
    posts: DynPostRepository,
    votes: DynVoteRepository,
}

fn require_viewer(viewer: Option<UserId>) -> AppResult<UserId> {
    viewer.ok_or(AppError::Unauthorized)
}

impl PostService {
    pub fn new(posts: DynPostRepository, votes: DynVoteRepository) -> Self {
        Self { posts, votes }
    }

    /// Record `viewer`'s vote on a post. Any positive `raw_value` is an
    /// upvote; anything else is a downvote.
    pub async fn apply_vote(
        &self,
        viewer: Option<UserId>,
        post_id: PostId,
        raw_value: i32,
    ) -> AppResult<VoteOutcome> {
        let user_id = require_viewer(viewer)?;
        let direction = VoteDirection::from_raw(raw_value);

        let outcome = self
            .votes
            .apply(VoteKey::new(user_id, post_id), direction)
            .await?;

        match outcome {
            VoteOutcome::Recorded { points_delta } => {
                tracing::debug!(user_id, post_id, points_delta, "vote recorded")
            }
            VoteOutcome::Unchanged => tracing::debug!(user_id, post_id, "repeat vote ignored"),
            VoteOutcome::PostNotFound => tracing::debug!(user_id, post_id, "vote on missing post"),
        }
        Ok(outcome)
    }

    pub async fn list_posts(
        &self,
        limit: i64,
        cursor: Option<&str>,
        viewer: Option<UserId>,
    ) -> AppResult<PostPage> {
        let cursor = cursor
            .map(str::parse::<Cursor>)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let request = PageRequest::new(limit, cursor);

        let rows = self.posts.list(&request, viewer).await?;
        Ok(PostPage::from_lookahead(rows, &request))
    }

    pub async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        Ok(self.posts.find(id).await?)
    }

    pub async fn create_post(
        &self,
        viewer: Option<UserId>,
        title: &str,
        text: &str,
    ) -> AppResult<Post> {
        let creator_id = require_viewer(viewer)?;
        let post = self.posts.create(creator_id, title, text).await?;
        tracing::info!(post_id = post.id, creator_id, "post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        viewer: Option<UserId>,
        id: PostId,
        title: &str,
        text: &str,
    ) -> AppResult<Option<Post>> {
        let owner = require_viewer(viewer)?;
        Ok(self.posts.update_owned(id, owner, title, text).await?)
    }

    pub async fn delete_post(&self, viewer: Option<UserId>, id: PostId) -> AppResult<bool> {
        let owner = require_viewer(viewer)?;
        let deleted = self.posts.delete_owned(id, owner).await?;
        if deleted {
            tracing::info!(post_id = id, owner, "post deleted");
        }
        Ok(deleted)
    }
}
