pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{Cursor, PageRequest, PostPage, PostView, VoteOutcome};
pub use repository::{
    DynPostRepository, DynVoteRepository, PostRepository, SqlitePostRepository,
    SqliteVoteRepository, VoteRepository,
};
pub use service::PostService;
