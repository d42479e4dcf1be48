// Request-scoped batch loaders. A fresh pair is built for every GraphQL
// request so nothing is cached across requests.
use async_graphql::dataloader::{DataLoader, Loader};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::models::{User, UserId, Vote, VoteKey};
use crate::db::RepositoryError;
use crate::posts::DynVoteRepository;
use crate::users::DynUserRepository;

pub struct UserLoader {
    users: DynUserRepository,
}

impl UserLoader {
    pub fn new(users: DynUserRepository) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl Loader<UserId> for UserLoader {
    type Value = User;
    type Error = Arc<RepositoryError>;

    async fn load(&self, keys: &[UserId]) -> Result<HashMap<UserId, User>, Self::Error> {
        tracing::trace!(batch = keys.len(), "loading users");
        let found = self.users.find_many(keys).await.map_err(Arc::new)?;
        Ok(keys
            .iter()
            .copied()
            .zip(found)
            .filter_map(|(id, user)| user.map(|user| (id, user)))
            .collect())
    }
}

pub struct VoteLoader {
    votes: DynVoteRepository,
}

impl VoteLoader {
    pub fn new(votes: DynVoteRepository) -> Self {
        Self { votes }
    }
}

#[async_trait::async_trait]
impl Loader<VoteKey> for VoteLoader {
    type Value = Vote;
    type Error = Arc<RepositoryError>;

    async fn load(&self, keys: &[VoteKey]) -> Result<HashMap<VoteKey, Vote>, Self::Error> {
        tracing::trace!(batch = keys.len(), "loading votes");
        let found = self.votes.find_many(keys).await.map_err(Arc::new)?;
        Ok(keys
            .iter()
            .copied()
            .zip(found)
            .filter_map(|(key, vote)| vote.map(|vote| (key, vote)))
            .collect())
    }
}

/// Both loaders for one request.
pub struct Loaders {
    pub users: DataLoader<UserLoader>,
    pub votes: DataLoader<VoteLoader>,
}

impl Loaders {
    pub fn new(users: DynUserRepository, votes: DynVoteRepository) -> Self {
        Self {
            users: DataLoader::new(UserLoader::new(users), tokio::spawn),
            votes: DataLoader::new(VoteLoader::new(votes), tokio::spawn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::posts::{PostRepository, SqlitePostRepository, SqliteVoteRepository, VoteRepository};
    use crate::users::{SqliteUserRepository, UserRepository};
    use crate::voting::VoteDirection;
    use tempfile::TempDir;

    struct Fixture {
        users: Arc<SqliteUserRepository>,
        posts: SqlitePostRepository,
        votes: Arc<SqliteVoteRepository>,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let pool = db::create_pool(&temp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        Fixture {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            posts: SqlitePostRepository::new(pool.clone()),
            votes: Arc::new(SqliteVoteRepository::new(pool)),
            _temp: temp,
        }
    }

    #[tokio::test]
    async fn user_loader_returns_one_slot_per_key() {
        let f = fixture();
        let a = f.users.create("alice", "a@example.com", "h").await.unwrap();
        let b = f.users.create("bob", "b@example.com", "h").await.unwrap();

        let loader = DataLoader::new(UserLoader::new(f.users.clone()), tokio::spawn);
        let found = loader.load_many([b.id, 404, a.id]).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[&a.id].username, "alice");
        assert_eq!(found[&b.id].username, "bob");
        assert!(loader.load_one(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vote_loader_resolves_composite_keys() {
        let f = fixture();
        let a = f.users.create("alice", "a@example.com", "h").await.unwrap();
        let p1 = f.posts.create(a.id, "one", "body").await.unwrap();
        let p2 = f.posts.create(a.id, "two", "body").await.unwrap();
        f.votes
            .apply(VoteKey::new(a.id, p2.id), VoteDirection::Down)
            .await
            .unwrap();

        let loader = DataLoader::new(VoteLoader::new(f.votes.clone()), tokio::spawn);
        assert!(loader
            .load_one(VoteKey::new(a.id, p1.id))
            .await
            .unwrap()
            .is_none());
        let vote = loader
            .load_one(VoteKey::new(a.id, p2.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vote.direction, VoteDirection::Down);
    }
}
