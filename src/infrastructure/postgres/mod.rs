//! PostgreSQL persistence module.
//!
//! Provides connection pooling for the sent-email store.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
