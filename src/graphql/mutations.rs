use async_graphql::*;

use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::db::models::PostId;
use crate::graphql::context::viewer;
use crate::graphql::types::{PostInput, PostObject, RegisterInput, UserResponse};
use crate::posts::PostService;
use crate::users::{AccountService, AuthOutcome, Registration};

/// Turn an auth outcome into a response, setting the session cookie on
/// success.
fn respond(ctx: &Context<'_>, accounts: &AccountService, outcome: AuthOutcome) -> UserResponse {
    match outcome {
        AuthOutcome::Authenticated {
            user,
            session_token,
        } => {
            ctx.append_http_header(
                "set-cookie",
                session_cookie(
                    accounts.cookie_name(),
                    &session_token,
                    accounts.session_hours(),
                ),
            );
            UserResponse::signed_in(&user)
        }
        AuthOutcome::Rejected(errors) => UserResponse::rejected(errors),
    }
}

/// GraphQL Mutation root
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Cast or change the viewer's vote. Any positive `value` counts as an
    /// upvote, anything else as a downvote. False when the post is gone.
    async fn vote(&self, ctx: &Context<'_>, post_id: PostId, value: i32) -> Result<bool> {
        let service = ctx.data::<PostService>()?;
        let outcome = service
            .apply_vote(viewer(ctx).user_id, post_id, value)
            .await
            .map_err(|e| e.extend())?;
        Ok(outcome.succeeded())
    }

    async fn create_post(&self, ctx: &Context<'_>, input: PostInput) -> Result<PostObject> {
        let service = ctx.data::<PostService>()?;
        let post = service
            .create_post(viewer(ctx).user_id, &input.title, &input.text)
            .await
            .map_err(|e| e.extend())?;
        Ok(PostObject::lazy(post))
    }

    /// Null unless the viewer owns the post.
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: PostId,
        title: String,
        text: String,
    ) -> Result<Option<PostObject>> {
        let service = ctx.data::<PostService>()?;
        let post = service
            .update_post(viewer(ctx).user_id, id, &title, &text)
            .await
            .map_err(|e| e.extend())?;
        Ok(post.map(PostObject::lazy))
    }

    /// Deletes the post and its votes. False unless the viewer owns it.
    async fn delete_post(&self, ctx: &Context<'_>, id: PostId) -> Result<bool> {
        let service = ctx.data::<PostService>()?;
        service
            .delete_post(viewer(ctx).user_id, id)
            .await
            .map_err(|e| e.extend())
    }

    async fn register(&self, ctx: &Context<'_>, options: RegisterInput) -> Result<UserResponse> {
        let accounts = ctx.data::<AccountService>()?;
        let outcome = accounts
            .register(Registration {
                username: options.username,
                email: options.email,
                password: options.password,
            })
            .await
            .map_err(|e| e.extend())?;
        Ok(respond(ctx, accounts, outcome))
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username_or_email: String,
        password: String,
    ) -> Result<UserResponse> {
        let accounts = ctx.data::<AccountService>()?;
        let outcome = accounts
            .login(&username_or_email, &password)
            .await
            .map_err(|e| e.extend())?;
        Ok(respond(ctx, accounts, outcome))
    }

    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let accounts = ctx.data::<AccountService>()?;
        let viewer = viewer(ctx);
        // Cleared even if the session row is already gone
        ctx.append_http_header("set-cookie", clear_session_cookie(accounts.cookie_name()));
        accounts
            .logout(viewer.session_token.as_deref())
            .map_err(|e| e.extend())
    }

    /// Always true, whether or not the address is registered.
    async fn forgot_password(&self, ctx: &Context<'_>, email: String) -> Result<bool> {
        let accounts = ctx.data::<AccountService>()?;
        accounts
            .forgot_password(&email)
            .await
            .map_err(|e| e.extend())
    }

    async fn change_password(
        &self,
        ctx: &Context<'_>,
        token: String,
        new_password: String,
    ) -> Result<UserResponse> {
        let accounts = ctx.data::<AccountService>()?;
        let outcome = accounts
            .change_password(&token, &new_password)
            .await
            .map_err(|e| e.extend())?;
        Ok(respond(ctx, accounts, outcome))
    }
}
