//! SQLite backend for the orgchart employee directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Hierarchy checks and the writes they
//! guard share one transaction.

mod accounts;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
