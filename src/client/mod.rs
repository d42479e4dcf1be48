//! GraphQL client with a normalized cache.
//!
//! Every operation goes transport → auth interceptor → cache patch. Queries
//! are answered from the cache when it holds the requested data; mutations
//! patch or invalidate exactly the cached fields they affect.

pub mod cache;
pub mod documents;
pub mod interceptor;
pub mod pagination;
pub mod transport;
pub mod updates;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::db::models::PostId;
use crate::voting::VoteDirection;
use cache::{NormalizedCache, PostsArgs};
use documents::{PaginatedPostsData, PostData, UserData, UserResponseData};
use interceptor::{AuthErrorInterceptor, Navigator};
use pagination::{resolve_posts, PostsView, Resolution};
use transport::{GraphQLError, GraphQLRequest, Transport};

pub use transport::HttpTransport;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("graphql: {}", .0.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; "))]
    GraphQL(Vec<GraphQLError>),

    #[error("not authorized")]
    Unauthorized,

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response has no data for `{0}`")]
    MissingData(&'static str),
}

pub struct Client<T> {
    transport: T,
    cache: Mutex<NormalizedCache>,
    interceptor: AuthErrorInterceptor,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, navigator: Arc<dyn Navigator>) -> Self {
        Self::with_interceptor(transport, AuthErrorInterceptor::new(navigator))
    }

    pub fn with_interceptor(transport: T, interceptor: AuthErrorInterceptor) -> Self {
        Self {
            transport,
            cache: Mutex::new(NormalizedCache::new()),
            interceptor,
        }
    }

    /// Never held across an await.
    fn cache(&self) -> MutexGuard<'_, NormalizedCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run an operation and decode `data.<field>`.
    async fn run<D: DeserializeOwned>(
        &self,
        query: impl Into<String>,
        variables: Value,
        field: &'static str,
    ) -> Result<D, ClientError> {
        let response = self
            .transport
            .execute(GraphQLRequest::new(query, variables))
            .await?;

        if self.interceptor.inspect(&response.errors) {
            return Err(ClientError::Unauthorized);
        }
        if !response.errors.is_empty() {
            return Err(ClientError::GraphQL(response.errors));
        }

        let value = response
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .ok_or(ClientError::MissingData(field))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Cache-only view of the `posts` field.
    pub fn cached_posts(&self, limit: i32, cursor: Option<String>) -> Resolution<PostsView> {
        resolve_posts(&self.cache(), &PostsArgs::new(limit, cursor))
    }

    /// Every page loaded so far, merged. Fetches the requested page first
    /// unless it is already cached.
    pub async fn posts(&self, limit: i32, cursor: Option<String>) -> Result<PostsView, ClientError> {
        let args = PostsArgs::new(limit, cursor);
        if let Resolution::Complete(view) = resolve_posts(&self.cache(), &args) {
            return Ok(view);
        }

        let page: PaginatedPostsData = self
            .run(
                documents::posts_query(),
                json!({ "limit": args.limit, "cursor": args.cursor }),
                "posts",
            )
            .await?;

        let mut cache = self.cache();
        cache.write_page(args.clone(), page);
        match resolve_posts(&cache, &args) {
            Resolution::Complete(view) => Ok(view),
            _ => Err(ClientError::MissingData("posts")),
        }
    }

    pub async fn post(&self, id: PostId) -> Result<Option<PostData>, ClientError> {
        if let Some(post) = self.cache().post(id) {
            return Ok(Some(post));
        }
        let post: Option<PostData> = self
            .run(documents::post_query(), json!({ "id": id }), "post")
            .await?;
        if let Some(post) = &post {
            self.cache().write_post(post.clone());
        }
        Ok(post)
    }

    pub async fn me(&self) -> Result<Option<UserData>, ClientError> {
        if let Some(me) = self.cache().me() {
            return Ok(me.cloned());
        }
        let me: Option<UserData> = self.run(documents::ME_QUERY, json!({}), "me").await?;
        self.cache().write_me(me.clone());
        Ok(me)
    }

    pub async fn vote(&self, post_id: PostId, value: i32) -> Result<bool, ClientError> {
        let recorded: bool = self
            .run(
                documents::VOTE_MUTATION,
                json!({ "postId": post_id, "value": value }),
                "vote",
            )
            .await?;
        if recorded {
            updates::vote_applied(&mut self.cache(), post_id, VoteDirection::from_raw(value));
        }
        Ok(recorded)
    }

    pub async fn create_post(&self, title: &str, text: &str) -> Result<PostData, ClientError> {
        let post: PostData = self
            .run(
                documents::create_post_mutation(),
                json!({ "input": { "title": title, "text": text } }),
                "createPost",
            )
            .await?;
        updates::post_created(&mut self.cache(), post.clone());
        Ok(post)
    }

    pub async fn update_post(
        &self,
        id: PostId,
        title: &str,
        text: &str,
    ) -> Result<Option<PostData>, ClientError> {
        let post: Option<PostData> = self
            .run(
                documents::update_post_mutation(),
                json!({ "id": id, "title": title, "text": text }),
                "updatePost",
            )
            .await?;
        if let Some(post) = &post {
            updates::post_updated(&mut self.cache(), post.clone());
        }
        Ok(post)
    }

    pub async fn delete_post(&self, id: PostId) -> Result<bool, ClientError> {
        let deleted: bool = self
            .run(documents::DELETE_POST_MUTATION, json!({ "id": id }), "deletePost")
            .await?;
        if deleted {
            updates::post_deleted(&mut self.cache(), id);
        }
        Ok(deleted)
    }

    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<UserResponseData, ClientError> {
        let response: UserResponseData = self
            .run(
                documents::login_mutation(),
                json!({ "usernameOrEmail": username_or_email, "password": password }),
                "login",
            )
            .await?;
        if let Some(user) = &response.user {
            updates::logged_in(&mut self.cache(), user.clone());
        }
        Ok(response)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserResponseData, ClientError> {
        let response: UserResponseData = self
            .run(
                documents::register_mutation(),
                json!({ "options": { "username": username, "email": email, "password": password } }),
                "register",
            )
            .await?;
        if let Some(user) = &response.user {
            updates::registered(&mut self.cache(), user.clone());
        }
        Ok(response)
    }

    pub async fn logout(&self) -> Result<bool, ClientError> {
        let done: bool = self
            .run(documents::LOGOUT_MUTATION, json!({}), "logout")
            .await?;
        updates::logged_out(&mut self.cache());
        Ok(done)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<bool, ClientError> {
        self.run(
            documents::FORGOT_PASSWORD_MUTATION,
            json!({ "email": email }),
            "forgotPassword",
        )
        .await
    }

    /// Signs the user in on success.
    pub async fn change_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<UserResponseData, ClientError> {
        let response: UserResponseData = self
            .run(
                documents::change_password_mutation(),
                json!({ "token": token, "newPassword": new_password }),
                "changePassword",
            )
            .await?;
        if let Some(user) = &response.user {
            updates::logged_in(&mut self.cache(), user.clone());
        }
        Ok(response)
    }
}
