// Library exports for lireddit
// The binary, the integration tests and the client all build on these modules

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod graphql;
pub mod loaders;
pub mod mail;
pub mod posts;
pub mod routes;
pub mod state;
pub mod users;
pub mod voting;
