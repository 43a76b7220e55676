//! # Postgres document store
//!
//! One row per document. Posts embed their comments and votes as JSONB
//! and carry a `version` column; the conditional `UPDATE … WHERE version`
//! is what gives the service layer its compare-and-swap contract.

pub mod posts;
pub mod users;

pub use posts::PgPostRepo;
pub use users::PgUserRepo;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use domains::StoreError;

/// Embedded schema migrations, run at startup by the binary.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

/// Maps driver failures into the port's error space, keeping unique-key
/// violations distinguishable.
pub(crate) fn map_db_err(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate(db_err.to_string());
        }
    }
    StoreError::Backend(err.to_string())
}
