use crate::client::cache::{NormalizedCache, PostsArgs};
use crate::client::documents::PostData;

/// Outcome of answering a query from the cache alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Nothing cached for the field; fetch from the network.
    Miss,
    /// Some pages are cached but not the requested one. The value is what
    /// the cache has so far; fetch the requested page and resolve again.
    Partial(T),
    Complete(T),
}

impl<T> Resolution<T> {
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Resolution::Complete(_))
    }
}

/// The merged `posts` field: every cached page concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsView {
    pub posts: Vec<PostData>,
    pub has_more: bool,
}

/// Rebuild one logical list from every cached `posts` page, in fetch order.
/// `has_more` is false as soon as any page reports the end. Evicted posts
/// are skipped.
pub fn resolve_posts(cache: &NormalizedCache, args: &PostsArgs) -> Resolution<PostsView> {
    let pages = cache.pages();
    if pages.is_empty() {
        return Resolution::Miss;
    }

    let view = PostsView {
        posts: pages
            .iter()
            .flat_map(|page| page.post_ids.iter())
            .filter_map(|&id| cache.post(id))
            .collect(),
        has_more: pages.iter().all(|page| page.has_more),
    };

    if cache.has_page(args) {
        Resolution::Complete(view)
    } else {
        Resolution::Partial(view)
    }
}
