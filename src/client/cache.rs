use std::collections::HashMap;

use crate::client::documents::{PaginatedPostsData, PostData, UserData};
use crate::db::models::{PostId, UserId};
use crate::voting::VoteDirection;

/// Arguments of one `posts` field fetch. Each distinct pair is its own
/// cached page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostsArgs {
    pub limit: i32,
    pub cursor: Option<String>,
}

impl PostsArgs {
    pub fn new(limit: i32, cursor: Option<String>) -> Self {
        Self { limit, cursor }
    }

    /// Stable field key, e.g. `posts({"cursor":null,"limit":10})`.
    pub fn field_key(&self) -> String {
        let args = serde_json::json!({ "limit": self.limit, "cursor": self.cursor });
        format!("posts({args})")
    }
}

/// A cached page holds references, not copies: entities live in the
/// entity store and are patched there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub args: PostsArgs,
    pub post_ids: Vec<PostId>,
    pub has_more: bool,
}

/// The two viewer-dependent fields a vote changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteFragment {
    pub points: i64,
    pub vote_status: Option<VoteDirection>,
}

#[derive(Debug, Default)]
pub struct NormalizedCache {
    posts: HashMap<PostId, PostData>,
    users: HashMap<UserId, UserData>,
    /// In fetch order.
    pages: Vec<PageRecord>,
    /// `None` until `me` has been fetched; `Some(None)` when signed out.
    me: Option<Option<UserId>>,
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The post with its `creator` read from the user store.
    pub fn post(&self, id: PostId) -> Option<PostData> {
        let mut post = self.posts.get(&id)?.clone();
        post.creator = self.users.get(&post.creator_id).cloned();
        Some(post)
    }

    pub fn user(&self, id: UserId) -> Option<&UserData> {
        self.users.get(&id)
    }

    /// The embedded creator is moved into the user store.
    pub fn write_post(&mut self, mut post: PostData) {
        if let Some(creator) = post.creator.take() {
            self.write_user(creator);
        }
        self.posts.insert(post.id, post);
    }

    pub fn write_user(&mut self, user: UserData) {
        self.users.insert(user.id, user);
    }

    /// Store a fetched page. Refetching the same arguments replaces the
    /// page in its original position.
    pub fn write_page(&mut self, args: PostsArgs, page: PaginatedPostsData) {
        let record = PageRecord {
            args,
            post_ids: page.posts.iter().map(|p| p.id).collect(),
            has_more: page.has_more,
        };
        tracing::trace!(field = %record.args.field_key(), posts = record.post_ids.len(), "caching page");
        for post in page.posts {
            self.write_post(post);
        }
        match self.pages.iter_mut().find(|p| p.args == record.args) {
            Some(existing) => *existing = record,
            None => self.pages.push(record),
        }
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn has_page(&self, args: &PostsArgs) -> bool {
        self.pages.iter().any(|p| &p.args == args)
    }

    /// Drop every cached `posts` page. Entities stay.
    pub fn invalidate_posts(&mut self) {
        tracing::debug!(pages = self.pages.len(), "invalidating cached post pages");
        self.pages.clear();
    }

    /// Drop everything whose value depends on who is signed in: pages,
    /// posts (voteStatus), users (email) and `me`.
    pub fn clear_viewer_data(&mut self) {
        tracing::debug!(
            posts = self.posts.len(),
            pages = self.pages.len(),
            "viewer changed, clearing cached entities"
        );
        self.pages.clear();
        self.posts.clear();
        self.users.clear();
        self.me = None;
    }

    /// True only when `me` was fetched or written and nobody is signed in.
    pub fn known_signed_out(&self) -> bool {
        self.me == Some(None)
    }

    /// Remove a post entity. Pages still list the id; readers skip it.
    pub fn evict_post(&mut self, id: PostId) -> bool {
        self.posts.remove(&id).is_some()
    }

    pub fn read_vote_fragment(&self, id: PostId) -> Option<VoteFragment> {
        let post = self.posts.get(&id)?;
        Some(VoteFragment {
            points: post.points,
            vote_status: post
                .vote_status
                .and_then(|raw| VoteDirection::try_from(raw).ok()),
        })
    }

    pub fn write_vote_fragment(&mut self, id: PostId, fragment: VoteFragment) -> bool {
        let Some(post) = self.posts.get_mut(&id) else {
            return false;
        };
        post.points = fragment.points;
        post.vote_status = fragment.vote_status.map(VoteDirection::value);
        true
    }

    /// `None` if `me` was never fetched.
    pub fn me(&self) -> Option<Option<&UserData>> {
        self.me
            .map(|id| id.and_then(|id| self.users.get(&id)))
    }

    pub fn write_me(&mut self, user: Option<UserData>) {
        self.me = Some(user.as_ref().map(|u| u.id));
        if let Some(user) = user {
            self.write_user(user);
        }
    }
}
