//! Store configuration.
//!
//! Loaded from an optional TOML file layered under `JOYCE_`-prefixed
//! environment variables, e.g. `JOYCE_STORE_PATH=/var/lib/app/joyce.db`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Settings for [`crate::SqliteStore::open_with_config`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
  /// SQLite database file; a leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// How long a statement waits on a locked database before failing.
  #[serde(default = "default_busy_timeout_ms")]
  pub busy_timeout_ms: u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("joyce.db") }

fn default_busy_timeout_ms() -> u64 { 5_000 }

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      store_path:      default_store_path(),
      busy_timeout_ms: default_busy_timeout_ms(),
    }
  }
}

impl StoreConfig {
  /// Read `path` (if it exists) and then the `JOYCE_*` environment.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path.as_ref()).required(false))
      .add_source(config::Environment::with_prefix("JOYCE"));
    Self::from_builder(builder)
  }

  pub(crate) fn from_builder(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> Result<Self> {
    Ok(builder.build()?.try_deserialize()?)
  }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{File, FileFormat};

  use super::*;

  #[test]
  fn empty_source_uses_defaults() {
    let builder = config::Config::builder().add_source(File::from_str("", FileFormat::Toml));
    let cfg = StoreConfig::from_builder(builder).unwrap();
    assert_eq!(cfg, StoreConfig::default());
  }

  #[test]
  fn toml_overrides_defaults() {
    let toml = r#"
      store_path = "/tmp/activities.db"
      busy_timeout_ms = 250
    "#;
    let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
    let cfg = StoreConfig::from_builder(builder).unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("/tmp/activities.db"));
    assert_eq!(cfg.busy_timeout_ms, 250);
  }

  #[test]
  fn absolute_path_is_not_expanded() {
    let cfg = StoreConfig { store_path: "/srv/joyce.db".into(), ..Default::default() };
    assert_eq!(cfg.resolved_store_path(), PathBuf::from("/srv/joyce.db"));
  }
}
