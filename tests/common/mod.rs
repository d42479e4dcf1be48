#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lireddit::config::Config;
use lireddit::db::models::{Post, User, UserId, Vote, VoteKey};
use lireddit::db::{self, RepositoryError};
use lireddit::extractors::Viewer;
use lireddit::graphql::prepare_request;
use lireddit::mail::MemoryMailer;
use lireddit::posts::{PostRepository, SqliteVoteRepository, VoteOutcome, VoteRepository};
use lireddit::state::{AppState, Repositories};
use lireddit::users::{SqliteUserRepository, UserRepository};
use lireddit::voting::VoteDirection;
use tempfile::TempDir;

pub struct TestApp {
    pub state: AppState,
    pub mailer: MemoryMailer,
    pub user_batches: Arc<AtomicUsize>,
    pub vote_batches: Arc<AtomicUsize>,
    _temp: TempDir,
}

/// Fresh database, low bcrypt cost, in-memory mailer, and repositories that
/// count batched lookups.
pub fn setup() -> TestApp {
    let temp = TempDir::new().unwrap();
    let pool = db::create_pool(&temp.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.auth.bcrypt_cost = 4;

    let user_batches = Arc::new(AtomicUsize::new(0));
    let vote_batches = Arc::new(AtomicUsize::new(0));
    let sqlite = Repositories::sqlite(&pool);
    let repos = Repositories {
        users: Arc::new(CountingUsers {
            inner: SqliteUserRepository::new(pool.clone()),
            batches: user_batches.clone(),
        }),
        posts: sqlite.posts,
        votes: Arc::new(CountingVotes {
            inner: SqliteVoteRepository::new(pool.clone()),
            batches: vote_batches.clone(),
        }),
    };

    let mailer = MemoryMailer::new();
    let state = AppState::with_parts(pool, config, repos, Arc::new(mailer.clone())).unwrap();

    TestApp {
        state,
        mailer,
        user_batches,
        vote_batches,
        _temp: temp,
    }
}

impl TestApp {
    pub async fn execute(&self, query: &str, viewer: Viewer) -> async_graphql::Response {
        let request = prepare_request(async_graphql::Request::new(query), &self.state.repos, viewer);
        self.state.graphql_schema.execute(request).await
    }

    /// Execute and return `data` as JSON, failing on any error.
    pub async fn data(&self, query: &str, viewer: Viewer) -> serde_json::Value {
        let result = self.execute(query, viewer).await;
        assert!(
            result.errors.is_empty(),
            "Expected no errors, got: {:?}",
            result.errors
        );
        result.data.into_json().unwrap()
    }

    pub async fn user(&self, username: &str) -> User {
        self.state
            .repos
            .users
            .create(username, &format!("{username}@example.com"), "unused-hash")
            .await
            .unwrap()
    }

    pub async fn post(&self, creator: UserId, title: &str) -> Post {
        self.state
            .repos
            .posts
            .create(creator, title, &format!("{title} body"))
            .await
            .unwrap()
    }
}

/// First error's `extensions.code`.
pub fn error_code(result: &async_graphql::Response) -> Option<String> {
    let json = serde_json::to_value(result).unwrap();
    json["errors"][0]["extensions"]["code"]
        .as_str()
        .map(str::to_string)
}

struct CountingUsers {
    inner: SqliteUserRepository,
    batches: Arc<AtomicUsize>,
}

#[async_trait]
impl UserRepository for CountingUsers {
    async fn create(&self, username: &str, email: &str, hash: &str) -> Result<User, RepositoryError> {
        self.inner.create(username, email, hash).await
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.find(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_by_email(email).await
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<Option<User>>, RepositoryError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.find_many(ids).await
    }

    async fn set_password(&self, id: UserId, hash: &str) -> Result<bool, RepositoryError> {
        self.inner.set_password(id, hash).await
    }
}

struct CountingVotes {
    inner: SqliteVoteRepository,
    batches: Arc<AtomicUsize>,
}

#[async_trait]
impl VoteRepository for CountingVotes {
    async fn apply(
        &self,
        key: VoteKey,
        direction: VoteDirection,
    ) -> Result<VoteOutcome, RepositoryError> {
        self.inner.apply(key, direction).await
    }

    async fn find_many(&self, keys: &[VoteKey]) -> Result<Vec<Option<Vote>>, RepositoryError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.find_many(keys).await
    }
}
