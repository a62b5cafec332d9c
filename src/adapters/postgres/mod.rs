//! PostgreSQL adapters - Database implementations for the persistence ports.
//!
//! - `PostgresCycleRepository` - `notification_cycles`
//! - `PostgresStatusStore` - `report_statuses` and the sweep queries
//! - `PostgresRosterDirectory` - read side of `participants`
//!
//! Schema lives in `migrations/` and is applied by [`run_migrations`].

mod cycle_repository;
mod roster_directory;
mod status_store;

pub use cycle_repository::PostgresCycleRepository;
pub use roster_directory::PostgresRosterDirectory;
pub use status_store::PostgresStatusStore;

use sqlx::PgPool;

use crate::domain::foundation::DomainError;

/// Applies pending migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database("Failed to run migrations", e))
}
