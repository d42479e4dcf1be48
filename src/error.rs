use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::db::RepositoryError;

/// Message carried by authorization failures. Clients match on it (or on the
/// `UNAUTHORIZED` extension code) to send the user to the login view.
pub const NOT_AUTHORIZED: &str = "not authorized";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{}", NOT_AUTHORIZED)]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable category, exposed as `extensions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a client. Internal causes are logged and masked.
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound => "Not found".to_string(),
            AppError::Unauthorized => NOT_AUTHORIZED.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
            other => {
                tracing::error!("{}", other);
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.public_message())
            .extend_with(|_, e| e.set("code", self.code()))
    }
}

pub type AppResult<T> = Result<T, AppError>;
