// Operation documents and the shapes their results decode into.
use serde::{Deserialize, Serialize};

use crate::db::models::{PostId, UserId};

const POST_FIELDS: &str = "id title text textSnippet points voteStatus creatorId createdAt updatedAt creator { id username email }";
const USER_RESPONSE_FIELDS: &str = "errors { field message } user { id username email }";

pub fn posts_query() -> String {
    format!(
        "query Posts($limit: Int!, $cursor: String) {{ posts(limit: $limit, cursor: $cursor) {{ hasMore posts {{ {POST_FIELDS} }} }} }}"
    )
}

pub fn post_query() -> String {
    format!("query Post($id: Int!) {{ post(id: $id) {{ {POST_FIELDS} }} }}")
}

pub const ME_QUERY: &str = "query Me { me { id username email } }";

pub const VOTE_MUTATION: &str =
    "mutation Vote($postId: Int!, $value: Int!) { vote(postId: $postId, value: $value) }";

pub fn create_post_mutation() -> String {
    format!(
        "mutation CreatePost($input: PostInput!) {{ createPost(input: $input) {{ {POST_FIELDS} }} }}"
    )
}

pub fn update_post_mutation() -> String {
    format!(
        "mutation UpdatePost($id: Int!, $title: String!, $text: String!) {{ updatePost(id: $id, title: $title, text: $text) {{ {POST_FIELDS} }} }}"
    )
}

pub const DELETE_POST_MUTATION: &str =
    "mutation DeletePost($id: Int!) { deletePost(id: $id) }";

pub fn login_mutation() -> String {
    format!(
        "mutation Login($usernameOrEmail: String!, $password: String!) {{ login(usernameOrEmail: $usernameOrEmail, password: $password) {{ {USER_RESPONSE_FIELDS} }} }}"
    )
}

pub fn register_mutation() -> String {
    format!(
        "mutation Register($options: RegisterInput!) {{ register(options: $options) {{ {USER_RESPONSE_FIELDS} }} }}"
    )
}

pub fn change_password_mutation() -> String {
    format!(
        "mutation ChangePassword($token: String!, $newPassword: String!) {{ changePassword(token: $token, newPassword: $newPassword) {{ {USER_RESPONSE_FIELDS} }} }}"
    )
}

pub const LOGOUT_MUTATION: &str = "mutation Logout { logout }";

pub const FORGOT_PASSWORD_MUTATION: &str =
    "mutation ForgotPassword($email: String!) { forgotPassword(email: $email) }";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pub id: PostId,
    pub title: String,
    pub text: String,
    pub text_snippet: String,
    pub points: i64,
    pub vote_status: Option<i32>,
    pub creator_id: UserId,
    pub created_at: String,
    pub updated_at: String,
    pub creator: Option<UserData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPostsData {
    pub has_more: bool,
    pub posts: Vec<PostData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorData {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponseData {
    pub errors: Option<Vec<FieldErrorData>>,
    pub user: Option<UserData>,
}
