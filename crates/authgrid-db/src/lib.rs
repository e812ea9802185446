//! AuthGrid Database: SurrealDB connection management, schema and
//! migrations, and repository implementations for the `authgrid-core`
//! traits.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
