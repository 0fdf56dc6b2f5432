//! PostgreSQL backend for the outreach encounter store.
//!
//! Connections come from a [`deadpool_postgres`] pool. Each operation is one
//! statement on one pooled connection, so row-level atomicity is whatever
//! PostgreSQL gives a single statement.

mod config;
mod row;
mod schema;
mod store;

pub mod error;

pub use config::PostgresConfig;
pub use error::{Error, Result};
pub use store::PostgresStore;
