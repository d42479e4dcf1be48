pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{FieldError, PublicUser, Registration};
pub use repository::{DynUserRepository, SqliteUserRepository, UserRepository};
pub use service::{AccountService, AuthOutcome};
