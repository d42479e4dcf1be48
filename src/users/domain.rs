use serde::{Deserialize, Serialize};

use crate::db::models::{User, UserId};

/// A validation failure attached to one input field. Returned as data, not
/// as a GraphQL error, so forms can render it next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

const TOO_SHORT: &str = "length must be greater than 2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// First failing rule wins.
    pub fn validate(&self) -> Option<FieldError> {
        if self.username.chars().count() <= 2 {
            return Some(FieldError::new("username", TOO_SHORT));
        }
        if self.username.contains('@') {
            return Some(FieldError::new("username", "username cannot include @"));
        }
        if let Some(err) = validate_password("password", &self.password) {
            return Some(err);
        }
        if !self.email.contains('@') {
            return Some(FieldError::new("email", "invalid email"));
        }
        None
    }
}

pub fn validate_password(field: &str, password: &str) -> Option<FieldError> {
    (password.chars().count() <= 2).then(|| FieldError::new(field, TOO_SHORT))
}

/// Field error for a UNIQUE violation on `column`.
pub fn taken(column: &str) -> FieldError {
    match column {
        "email" => FieldError::new("email", "email already taken"),
        _ => FieldError::new("username", "username already taken"),
    }
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Public projection of a user. Email is only visible to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PublicUser {
    pub fn for_viewer(user: &User, viewer: Option<UserId>) -> Self {
        let email = if viewer == Some(user.id) {
            user.email.clone()
        } else {
            String::new()
        };
        Self {
            id: user.id,
            username: user.username.clone(),
            email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
