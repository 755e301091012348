//! Persistence of sent emails.
//!
//! # Backend Architecture
//!
//! - `MemoryEmailStore`: in-memory storage using DashMap
//! - `PostgresEmailStore`: the `emails` table in PostgreSQL
//!
//! Use `create_email_store()` to pick the backend from configuration.

mod backend;
mod memory_backend;
mod postgres_backend;

use std::sync::Arc;

use crate::infrastructure::postgres::PostgresPool;

pub use backend::{EmailRecord, EmailStore, StorageError};
pub use memory_backend::MemoryEmailStore;
pub use postgres_backend::PostgresEmailStore;

/// Create a sent-email store.
///
/// Returns a `PostgresEmailStore` when a pool is given (after making sure the
/// `emails` table exists), otherwise `None`: recording sends is optional.
pub async fn create_email_store(
    postgres_pool: Option<&PostgresPool>,
) -> Result<Option<Arc<dyn EmailStore>>, StorageError> {
    match postgres_pool {
        Some(pool) => {
            let store = PostgresEmailStore::new(pool.pool().clone());
            store.ensure_schema().await?;
            tracing::info!(backend = "postgres", "Creating sent-email store");
            Ok(Some(Arc::new(store)))
        }
        None => {
            tracing::info!("No database configured, sent emails will not be recorded");
            Ok(None)
        }
    }
}
