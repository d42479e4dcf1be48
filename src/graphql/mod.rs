pub mod context;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

pub use context::prepare_request;
pub use schema::{build_schema, AppSchema};
