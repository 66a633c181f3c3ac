//! Error types for `joyce-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An argument had the wrong shape, e.g. targets that are not a mapping.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// An activity was about to be persisted without an actor or a verb.
  #[error("required field missing: {0}")]
  RequiredFieldMissing(&'static str),

  /// A stored verb or entity kind is not registered (any more).
  #[error("unresolvable type: {0:?}")]
  UnresolvableType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
