//! Error type for `joyce-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] joyce_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A polymorphic column pair had only one half set.
  #[error("corrupt row: {0}")]
  Corrupt(String),

  #[error("activity not found: {0}")]
  ActivityNotFound(uuid::Uuid),

  #[error("stream not found: {0}")]
  StreamNotFound(uuid::Uuid),

  #[error("subscription not found: {0}")]
  SubscriptionNotFound(uuid::Uuid),

  #[error("subscription {0} has already ended")]
  SubscriptionEnded(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
