//! Persistent storage for the scheduler.
//!
//! This module provides the storage layer, including:
//!
//! - SQLite database for accounts, leads, and the activity log
//! - Async-safe database operations via tokio::task::spawn_blocking
//! - Adapters implementing the service storage traits

mod database;
pub mod queries;
mod schema;
mod store;

pub use database::{Database, DatabaseError, Result};
pub use store::{SqliteAccountStore, SqliteLeadStore};
