//! SQLite backend for Joyce activity streams.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::StoreConfig;
pub use store::SqliteStore;
