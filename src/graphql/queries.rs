use async_graphql::*;

use crate::db::models::PostId;
use crate::graphql::context::viewer;
use crate::graphql::types::{PaginatedPosts, PostObject, UserObject};
use crate::posts::PostService;
use crate::users::AccountService;

/// GraphQL Query root
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Newest posts first. Pass the last post's `createdAt` as `cursor` to
    /// continue. `limit` is capped at 50.
    async fn posts(
        &self,
        ctx: &Context<'_>,
        limit: i32,
        cursor: Option<String>,
    ) -> Result<PaginatedPosts> {
        let service = ctx.data::<PostService>()?;
        let page = service
            .list_posts(i64::from(limit), cursor.as_deref(), viewer(ctx).user_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(page.into())
    }

    async fn post(&self, ctx: &Context<'_>, id: PostId) -> Result<Option<PostObject>> {
        let service = ctx.data::<PostService>()?;
        let post = service.get_post(id).await.map_err(|e| e.extend())?;
        Ok(post.map(PostObject::lazy))
    }

    /// The signed-in user, or null.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserObject>> {
        let accounts = ctx.data::<AccountService>()?;
        let viewer_id = viewer(ctx).user_id;
        let user = accounts.me(viewer_id).await.map_err(|e| e.extend())?;
        Ok(user.map(|user| UserObject::for_viewer(&user, viewer_id)))
    }
}
