// Domain types for the read path - pure, no side effects
use std::fmt;
use std::str::FromStr;

use crate::db::models::Post;
use crate::voting::VoteDirection;

/// Hard ceiling on page size regardless of what the client asks for.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Length (in characters) of the body preview served in list views.
pub const SNIPPET_LENGTH: usize = 50;

/// Exclusive pagination boundary: the creation time (ms since epoch) of the
/// last post the client has already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub i64);

impl Cursor {
    pub fn after(post: &Post) -> Self {
        Self(post.created_at)
    }

    pub fn millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cursor {0:?}")]
pub struct InvalidCursor(pub String);

impl FromStr for Cursor {
    type Err = InvalidCursor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Cursor)
            .map_err(|_| InvalidCursor(s.to_string()))
    }
}

/// Validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub cursor: Option<Cursor>,
}

impl PageRequest {
    pub fn new(limit: i64, cursor: Option<Cursor>) -> Self {
        Self {
            limit: limit.clamp(0, MAX_PAGE_SIZE),
            cursor,
        }
    }

    /// Rows to ask the store for: one extra as a lookahead for `has_more`.
    pub fn fetch_size(&self) -> i64 {
        self.limit + 1
    }
}

/// A post as seen by one particular viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub vote_status: Option<VoteDirection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub posts: Vec<PostView>,
    pub has_more: bool,
}

impl PostPage {
    /// Split a lookahead fetch into the page proper and the `has_more` flag.
    pub fn from_lookahead(mut rows: Vec<PostView>, request: &PageRequest) -> Self {
        let has_more = rows.len() as i64 == request.fetch_size();
        rows.truncate(request.limit as usize);
        Self {
            posts: rows,
            has_more,
        }
    }

    /// Cursor for the next page, if this page has any posts.
    pub fn next_cursor(&self) -> Option<Cursor> {
        self.posts.last().map(|view| Cursor::after(&view.post))
    }
}

/// What `apply_vote` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded { points_delta: i64 },
    Unchanged,
    PostNotFound,
}

impl VoteOutcome {
    pub fn succeeded(self) -> bool {
        !matches!(self, Self::PostNotFound)
    }
}

pub fn text_snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_LENGTH) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_at(created_at: i64) -> PostView {
        PostView {
            post: Post {
                id: created_at,
                title: "t".into(),
                text: "b".into(),
                points: 0,
                creator_id: 1,
                created_at,
                updated_at: created_at,
            },
            vote_status: None,
        }
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::new(500, None).limit, 50);
        assert_eq!(PageRequest::new(10, None).limit, 10);
        assert_eq!(PageRequest::new(-3, None).limit, 0);
        assert_eq!(PageRequest::new(50, None).fetch_size(), 51);
    }

    #[test]
    fn cursor_round_trips_through_its_string_form() {
        let cursor: Cursor = "1700116070550".parse().unwrap();
        assert_eq!(cursor.millis(), 1_700_116_070_550);
        assert_eq!(cursor.to_string(), "1700116070550");
        assert!("yesterday".parse::<Cursor>().is_err());
    }

    #[test]
    fn lookahead_row_sets_has_more() {
        let request = PageRequest::new(2, None);
        let page = PostPage::from_lookahead(vec![post_at(3), post_at(2), post_at(1)], &request);
        assert!(page.has_more);
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.next_cursor(), Some(Cursor(2)));

        let page = PostPage::from_lookahead(vec![post_at(3), post_at(2)], &request);
        assert!(!page.has_more);
        assert_eq!(page.posts.len(), 2);
    }

    #[test]
    fn snippet_truncates_long_text_on_char_boundaries() {
        let short = "hello";
        assert_eq!(text_snippet(short), "hello");

        let exact = "a".repeat(50);
        assert_eq!(text_snippet(&exact), exact);

        let long = "é".repeat(60);
        let snippet = text_snippet(&long);
        assert_eq!(snippet, format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn missing_post_is_the_only_failed_outcome() {
        assert!(VoteOutcome::Unchanged.succeeded());
        assert!(VoteOutcome::Recorded { points_delta: 2 }.succeeded());
        assert!(!VoteOutcome::PostNotFound.succeeded());
    }
}
