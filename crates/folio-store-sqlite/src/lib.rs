//! SQLite backend for the Folio version store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] serves as both the
//! [`VersionStore`](folio_core::store::VersionStore) and the
//! [`ContentBackend`](folio_core::content::ContentBackend).

mod content;
mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
