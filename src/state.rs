use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::graphql::{build_schema, AppSchema};
use crate::mail::{DynMailer, LogMailer};
use crate::posts::{DynPostRepository, DynVoteRepository, PostService};
use crate::posts::{SqlitePostRepository, SqliteVoteRepository};
use crate::users::{AccountService, DynUserRepository, SqliteUserRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

/// The storage seams. Tests swap in wrapped implementations.
#[derive(Clone)]
pub struct Repositories {
    pub users: DynUserRepository,
    pub posts: DynPostRepository,
    pub votes: DynVoteRepository,
}

impl Repositories {
    pub fn sqlite(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            posts: Arc::new(SqlitePostRepository::new(pool.clone())),
            votes: Arc::new(SqliteVoteRepository::new(pool.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub repos: Repositories,
    pub graphql_schema: AppSchema,
}

impl AppState {
    /// SQLite-backed state that logs outgoing mail.
    pub fn new(db: DbPool, config: Config) -> anyhow::Result<Self> {
        let mailer: DynMailer = Arc::new(LogMailer::new(config.mail.from.clone()));
        let repos = Repositories::sqlite(&db);
        Self::with_parts(db, config, repos, mailer)
    }

    pub fn with_parts(
        db: DbPool,
        config: Config,
        repos: Repositories,
        mailer: DynMailer,
    ) -> anyhow::Result<Self> {
        let posts = PostService::new(repos.posts.clone(), repos.votes.clone());
        let accounts = AccountService::new(
            repos.users.clone(),
            db.clone(),
            mailer,
            config.auth.clone(),
            config.public_url()?,
        );

        Ok(Self {
            graphql_schema: build_schema(posts, accounts),
            db,
            config,
            repos,
        })
    }
}
