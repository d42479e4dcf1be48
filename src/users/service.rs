use crate::auth::{password_reset, session};
use crate::config::AuthConfig;
use crate::db::models::{User, UserId};
use crate::db::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::mail::{password_reset_mail, DynMailer};
use crate::state::DbPool;
use crate::users::domain::{
    hash_password, taken, validate_password, verify_password, FieldError, Registration,
};
use crate::users::repository::DynUserRepository;

/// Result of an operation that logs a user in.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated { user: User, session_token: String },
    Rejected(Vec<FieldError>),
}

impl AuthOutcome {
    fn reject(error: FieldError) -> Self {
        AuthOutcome::Rejected(vec![error])
    }
}

#[derive(Clone)]
pub struct AccountService {
    users: DynUserRepository,
    db: DbPool,
    mailer: DynMailer,
    auth: AuthConfig,
    public_url: url::Url,
}

impl AccountService {
    pub fn new(
        users: DynUserRepository,
        db: DbPool,
        mailer: DynMailer,
        auth: AuthConfig,
        public_url: url::Url,
    ) -> Self {
        Self {
            users,
            db,
            mailer,
            auth,
            public_url,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.auth.cookie_name
    }

    pub fn session_hours(&self) -> u64 {
        self.auth.session_hours
    }

    pub async fn me(&self, viewer: Option<UserId>) -> AppResult<Option<User>> {
        match viewer {
            Some(id) => Ok(self.users.find(id).await?),
            None => Ok(None),
        }
    }

    pub async fn register(&self, registration: Registration) -> AppResult<AuthOutcome> {
        if let Some(error) = registration.validate() {
            return Ok(AuthOutcome::reject(error));
        }

        let hash = hash_password(&registration.password, self.auth.bcrypt_cost)?;
        let user = match self
            .users
            .create(&registration.username, &registration.email, &hash)
            .await
        {
            Ok(user) => user,
            Err(RepositoryError::Conflict(column)) => {
                return Ok(AuthOutcome::reject(taken(&column)))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        self.start_session(user)
    }

    /// `username_or_email` is treated as an email when it contains "@".
    pub async fn login(&self, username_or_email: &str, password: &str) -> AppResult<AuthOutcome> {
        let user = if username_or_email.contains('@') {
            self.users.find_by_email(username_or_email).await?
        } else {
            self.users.find_by_username(username_or_email).await?
        };

        let Some(user) = user else {
            return Ok(AuthOutcome::reject(FieldError::new(
                "usernameOrEmail",
                "that username or email doesn't exist",
            )));
        };

        if !verify_password(password, &user.password_hash) {
            tracing::debug!(user_id = user.id, "login rejected: wrong password");
            return Ok(AuthOutcome::reject(FieldError::new(
                "password",
                "incorrect password",
            )));
        }

        self.start_session(user)
    }

    pub fn logout(&self, session_token: Option<&str>) -> AppResult<bool> {
        if let Some(token) = session_token {
            session::delete_session(&self.db, token)?;
        }
        Ok(true)
    }

    /// Always succeeds so the response does not reveal which emails exist.
    pub async fn forgot_password(&self, email: &str) -> AppResult<bool> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(true);
        };

        let token = password_reset::issue_reset_token(
            &self.db,
            user.id,
            self.auth.password_reset_minutes,
        )?;
        let mail = password_reset_mail(&user.email, &self.public_url, &token);
        self.mailer
            .send(mail)
            .await
            .map_err(|e| AppError::Internal(format!("failed to send reset mail: {e}")))?;

        tracing::info!(user_id = user.id, "password reset mail sent");
        Ok(true)
    }

    pub async fn change_password(&self, token: &str, new_password: &str) -> AppResult<AuthOutcome> {
        if let Some(error) = validate_password("newPassword", new_password) {
            return Ok(AuthOutcome::reject(error));
        }

        let Some(user_id) = password_reset::consume_reset_token(&self.db, token)? else {
            return Ok(AuthOutcome::reject(FieldError::new(
                "token",
                "This change password link is expired",
            )));
        };

        let hash = hash_password(new_password, self.auth.bcrypt_cost)?;
        if !self.users.set_password(user_id, &hash).await? {
            return Ok(AuthOutcome::reject(FieldError::new(
                "token",
                "user no longer exists",
            )));
        }

        let user = self
            .users
            .find(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(user_id, "password changed");
        self.start_session(user)
    }

    fn start_session(&self, user: User) -> AppResult<AuthOutcome> {
        let session_token = session::create_session(&self.db, user.id, self.auth.session_hours)?;
        Ok(AuthOutcome::Authenticated {
            user,
            session_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::mail::MemoryMailer;
    use crate::users::repository::SqliteUserRepository;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service() -> (AccountService, MemoryMailer, DbPool, TempDir) {
        let temp = TempDir::new().unwrap();
        let pool = db::create_pool(&temp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        let mailer = MemoryMailer::new();
        let auth = AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        };
        let svc = AccountService::new(
            Arc::new(SqliteUserRepository::new(pool.clone())),
            pool.clone(),
            Arc::new(mailer.clone()),
            auth,
            url::Url::parse("http://localhost:3000/").unwrap(),
        );
        (svc, mailer, pool, temp)
    }

    fn alice() -> Registration {
        Registration {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret".into(),
        }
    }

    fn rejected_field(outcome: AuthOutcome) -> String {
        match outcome {
            AuthOutcome::Rejected(errors) => errors[0].field.clone(),
            AuthOutcome::Authenticated { .. } => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn register_creates_a_session() {
        let (svc, _mailer, pool, _temp) = service();
        let AuthOutcome::Authenticated { user, session_token } = svc.register(alice()).await.unwrap()
        else {
            panic!("expected success");
        };
        assert_ne!(user.password_hash, "secret");
        assert_eq!(
            session::lookup_session(&pool, &session_token).unwrap(),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn register_reports_validation_and_duplicates_as_field_errors() {
        let (svc, _mailer, _pool, _temp) = service();
        let mut bad = alice();
        bad.username = "al".into();
        assert_eq!(rejected_field(svc.register(bad).await.unwrap()), "username");

        svc.register(alice()).await.unwrap();
        assert_eq!(rejected_field(svc.register(alice()).await.unwrap()), "username");

        let mut same_email = alice();
        same_email.username = "alicia".into();
        assert_eq!(rejected_field(svc.register(same_email).await.unwrap()), "email");
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let (svc, _mailer, _pool, _temp) = service();
        svc.register(alice()).await.unwrap();

        assert!(matches!(
            svc.login("alice", "secret").await.unwrap(),
            AuthOutcome::Authenticated { .. }
        ));
        assert!(matches!(
            svc.login("alice@example.com", "secret").await.unwrap(),
            AuthOutcome::Authenticated { .. }
        ));
        assert_eq!(
            rejected_field(svc.login("bob", "secret").await.unwrap()),
            "usernameOrEmail"
        );
        assert_eq!(
            rejected_field(svc.login("alice", "wrong").await.unwrap()),
            "password"
        );
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let (svc, _mailer, pool, _temp) = service();
        let AuthOutcome::Authenticated { session_token, .. } = svc.register(alice()).await.unwrap()
        else {
            panic!("expected success");
        };
        assert!(svc.logout(Some(&session_token)).unwrap());
        assert_eq!(session::lookup_session(&pool, &session_token).unwrap(), None);
        assert!(svc.logout(None).unwrap());
    }

    #[tokio::test]
    async fn forgot_password_mails_only_known_addresses() {
        let (svc, mailer, _pool, _temp) = service();
        svc.register(alice()).await.unwrap();

        assert!(svc.forgot_password("nobody@example.com").await.unwrap());
        assert!(mailer.sent().is_empty());

        assert!(svc.forgot_password("alice@example.com").await.unwrap());
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert!(sent[0].html.contains("http://localhost:3000/change-password/"));
    }

    #[tokio::test]
    async fn change_password_consumes_the_token() {
        let (svc, _mailer, pool, _temp) = service();
        let AuthOutcome::Authenticated { user, .. } = svc.register(alice()).await.unwrap() else {
            panic!("expected success");
        };
        let token = password_reset::issue_reset_token(&pool, user.id, 15).unwrap();

        assert_eq!(
            rejected_field(svc.change_password(&token, "pw").await.unwrap()),
            "newPassword"
        );
        assert!(matches!(
            svc.change_password(&token, "brand-new").await.unwrap(),
            AuthOutcome::Authenticated { .. }
        ));
        assert_eq!(
            rejected_field(svc.change_password(&token, "again-new").await.unwrap()),
            "token"
        );

        assert!(matches!(
            svc.login("alice", "brand-new").await.unwrap(),
            AuthOutcome::Authenticated { .. }
        ));
        assert_eq!(rejected_field(svc.login("alice", "secret").await.unwrap()), "password");
    }
}
