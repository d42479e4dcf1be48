// Cache patches applied after each mutation succeeds.
use crate::client::cache::{NormalizedCache, VoteFragment};
use crate::client::documents::{PostData, UserData};
use crate::db::models::PostId;
use crate::voting::{points_delta, VoteDirection};

/// Patch points and voteStatus in place with the same rule the server
/// uses. Returns false when nothing changed (post not cached, or a repeat
/// vote).
pub fn vote_applied(cache: &mut NormalizedCache, post_id: PostId, requested: VoteDirection) -> bool {
    let Some(fragment) = cache.read_vote_fragment(post_id) else {
        return false;
    };
    let Some(delta) = points_delta(fragment.vote_status, requested) else {
        return false;
    };
    cache.write_vote_fragment(
        post_id,
        VoteFragment {
            points: fragment.points + delta,
            vote_status: Some(requested),
        },
    )
}

/// A new post's place in the list is only known to the server.
pub fn post_created(cache: &mut NormalizedCache, post: PostData) {
    cache.write_post(post);
    cache.invalidate_posts();
}

pub fn post_updated(cache: &mut NormalizedCache, post: PostData) {
    cache.write_post(post);
}

pub fn post_deleted(cache: &mut NormalizedCache, post_id: PostId) {
    cache.evict_post(post_id);
}

/// Vote status and email visibility depend on the viewer, so cached pages
/// and entities are dropped before `me` is written.
pub fn logged_in(cache: &mut NormalizedCache, user: UserData) {
    cache.clear_viewer_data();
    cache.write_me(Some(user));
}

/// A new account has no votes. The cache only survives when it is known to
/// hold anonymous data; a previous session's data is dropped.
pub fn registered(cache: &mut NormalizedCache, user: UserData) {
    if !cache.known_signed_out() {
        cache.clear_viewer_data();
    }
    cache.write_me(Some(user));
}

pub fn logged_out(cache: &mut NormalizedCache) {
    cache.clear_viewer_data();
    cache.write_me(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::cache::tests::{page, post};
    use crate::client::cache::PostsArgs;

    fn cache_with(points: i64, vote_status: Option<i32>) -> NormalizedCache {
        let mut cache = NormalizedCache::new();
        cache.write_post(post(1, points, vote_status));
        cache
    }

    #[test]
    fn first_vote_moves_points_by_one() {
        let mut cache = cache_with(5, None);
        assert!(vote_applied(&mut cache, 1, VoteDirection::Up));
        assert_eq!(cache.post(1).unwrap().points, 6);
        assert_eq!(cache.post(1).unwrap().vote_status, Some(1));
    }

    #[test]
    fn flip_moves_points_by_two() {
        let mut cache = cache_with(6, Some(1));
        assert!(vote_applied(&mut cache, 1, VoteDirection::Down));
        assert_eq!(cache.post(1).unwrap().points, 4);
        assert_eq!(cache.post(1).unwrap().vote_status, Some(-1));
    }

    #[test]
    fn repeat_vote_is_a_no_op() {
        let mut cache = cache_with(4, Some(-1));
        assert!(!vote_applied(&mut cache, 1, VoteDirection::Down));
        assert_eq!(cache.post(1).unwrap().points, 4);
    }

    #[test]
    fn vote_on_uncached_post_is_ignored() {
        let mut cache = NormalizedCache::new();
        assert!(!vote_applied(&mut cache, 42, VoteDirection::Up));
    }

    #[test]
    fn create_invalidates_every_page_variant() {
        let mut cache = NormalizedCache::new();
        cache.write_page(PostsArgs::new(2, None), page(&[4, 3], true));
        cache.write_page(PostsArgs::new(2, Some("1003".into())), page(&[2, 1], false));
        post_created(&mut cache, post(5, 0, None));
        assert!(cache.pages().is_empty());
        assert!(cache.post(5).is_some());
    }

    #[test]
    fn delete_evicts_only_that_post() {
        let mut cache = NormalizedCache::new();
        cache.write_page(PostsArgs::new(2, None), page(&[2, 1], false));
        post_deleted(&mut cache, 2);
        assert!(cache.post(2).is_none());
        assert!(cache.post(1).is_some());
        assert_eq!(cache.pages().len(), 1);
    }

    fn user(id: i64, username: &str) -> UserData {
        UserData {
            id,
            username: username.into(),
            email: format!("{username}@example.com"),
        }
    }

    #[test]
    fn auth_patches_write_me() {
        let alice = user(1, "alice");
        let mut cache = NormalizedCache::new();
        cache.write_me(None);
        cache.write_page(PostsArgs::new(2, None), page(&[2, 1], false));

        registered(&mut cache, alice.clone());
        assert_eq!(cache.pages().len(), 1);

        logged_in(&mut cache, alice.clone());
        assert_eq!(cache.me(), Some(Some(&alice)));
        assert!(cache.pages().is_empty());

        logged_out(&mut cache);
        assert_eq!(cache.me(), Some(None));
    }

    #[test]
    fn login_drops_the_previous_viewers_vote_status() {
        let mut cache = cache_with(1, None);
        logged_in(&mut cache, user(2, "bob"));
        assert!(cache.post(1).is_none());

        // Nothing cached, so a vote cannot drift points locally
        assert!(!vote_applied(&mut cache, 1, VoteDirection::Up));
    }

    #[test]
    fn register_over_an_existing_session_drops_entities() {
        let mut cache = cache_with(3, Some(1));
        cache.write_me(Some(user(1, "alice")));

        registered(&mut cache, user(2, "bob"));
        assert!(cache.post(1).is_none());
        assert_eq!(cache.me().unwrap().unwrap().username, "bob");
    }

    #[test]
    fn logout_drops_entities() {
        let mut cache = cache_with(3, Some(1));
        logged_out(&mut cache);
        assert!(cache.post(1).is_none());
        assert!(cache.known_signed_out());
    }
}
