use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;
use crate::posts::PostService;
use crate::users::AccountService;

/// GraphQL Schema type
pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema. Services are shared by every request;
/// per-request data is added by `prepare_request`.
pub fn build_schema(posts: PostService, accounts: AccountService) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(posts)
        .data(accounts)
        .finish()
}
