use async_graphql::*;

use crate::db::models::{Post, PostId, User, UserId, VoteKey};
use crate::error::AppError;
use crate::graphql::context::{loaders, viewer};
use crate::posts::{PostPage, PostView};
use crate::posts::domain::text_snippet;
use crate::users::{FieldError, PublicUser};
use crate::voting::VoteDirection;

/// What the server already knows about the viewer's vote on a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerVote {
    /// Came back from the list query's ledger subquery.
    Resolved(Option<VoteDirection>),
    /// Not fetched yet; resolved through the vote loader on demand.
    Lazy,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(complex, name = "Post")]
pub struct PostObject {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub points: i64,
    pub creator_id: UserId,
    /// Milliseconds since the epoch, as a string.
    pub created_at: String,
    pub updated_at: String,
    #[graphql(skip)]
    pub viewer_vote: ViewerVote,
}

impl PostObject {
    pub fn lazy(post: Post) -> Self {
        Self::with_vote(post, ViewerVote::Lazy)
    }

    fn with_vote(post: Post, viewer_vote: ViewerVote) -> Self {
        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            points: post.points,
            creator_id: post.creator_id,
            created_at: post.created_at.to_string(),
            updated_at: post.updated_at.to_string(),
            viewer_vote,
        }
    }
}

impl From<PostView> for PostObject {
    fn from(view: PostView) -> Self {
        Self::with_vote(view.post, ViewerVote::Resolved(view.vote_status))
    }
}

#[ComplexObject]
impl PostObject {
    /// First 50 characters of the body, with "..." when cut.
    async fn text_snippet(&self) -> String {
        text_snippet(&self.text)
    }

    /// The viewer's vote: 1, -1, or null.
    async fn vote_status(&self, ctx: &Context<'_>) -> Result<Option<i32>> {
        let direction = match self.viewer_vote {
            ViewerVote::Resolved(direction) => direction,
            ViewerVote::Lazy => {
                let Some(user_id) = viewer(ctx).user_id else {
                    return Ok(None);
                };
                loaders(ctx)?
                    .votes
                    .load_one(VoteKey::new(user_id, self.id))
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()).extend())?
                    .map(|vote| vote.direction)
            }
        };
        Ok(direction.map(VoteDirection::value))
    }

    async fn creator(&self, ctx: &Context<'_>) -> Result<UserObject> {
        let user = loaders(ctx)?
            .users
            .load_one(self.creator_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()).extend())?
            .ok_or_else(|| AppError::NotFound.extend())?;
        Ok(UserObject::for_viewer(&user, viewer(ctx).user_id))
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: UserId,
    pub username: String,
    /// Empty unless the viewer is this user.
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserObject {
    pub fn for_viewer(user: &User, viewer: Option<UserId>) -> Self {
        PublicUser::for_viewer(user, viewer).into()
    }
}

impl From<PublicUser> for UserObject {
    fn from(user: PublicUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at.to_string(),
            updated_at: user.updated_at.to_string(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct PaginatedPosts {
    pub posts: Vec<PostObject>,
    pub has_more: bool,
}

impl From<PostPage> for PaginatedPosts {
    fn from(page: PostPage) -> Self {
        Self {
            posts: page.posts.into_iter().map(PostObject::from).collect(),
            has_more: page.has_more,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "FieldError")]
pub struct FieldErrorObject {
    pub field: String,
    pub message: String,
}

impl From<FieldError> for FieldErrorObject {
    fn from(error: FieldError) -> Self {
        Self {
            field: error.field,
            message: error.message,
        }
    }
}

/// Either field errors or the signed-in user.
#[derive(Clone, Debug, SimpleObject)]
pub struct UserResponse {
    pub errors: Option<Vec<FieldErrorObject>>,
    pub user: Option<UserObject>,
}

impl UserResponse {
    pub fn rejected(errors: Vec<FieldError>) -> Self {
        Self {
            errors: Some(errors.into_iter().map(FieldErrorObject::from).collect()),
            user: None,
        }
    }

    pub fn signed_in(user: &User) -> Self {
        Self {
            errors: None,
            user: Some(UserObject::for_viewer(user, Some(user.id))),
        }
    }
}

#[derive(Debug, InputObject)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

#[derive(Debug, InputObject)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}
