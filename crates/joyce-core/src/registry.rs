//! Verbs and the registry that resolves stored type names.
//!
//! Activities store their verb as a plain string. Reading it back goes through
//! a [`TypeRegistry`]: a name that was renamed or never registered is an
//! explicit [`Error::UnresolvableType`] rather than a silent fallback.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::{Entity, EntityRef},
};

// ─── Verb ────────────────────────────────────────────────────────────────────

/// Implemented by host marker types that name an action, e.g. `struct Follow;`.
pub trait VerbKind {
  /// Canonical name written to the `verb` column.
  const NAME: &'static str;
}

/// A verb by its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verb(String);

impl Verb {
  pub fn of<V: VerbKind>() -> Self { Self(V::NAME.to_owned()) }

  pub fn named(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn name(&self) -> &str { &self.0 }

  pub fn is<V: VerbKind>(&self) -> bool { self.0 == V::NAME }

  pub fn into_name(self) -> String { self.0 }
}

impl fmt::Display for Verb {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The set of verb names and entity kinds the host application knows about.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
  verbs: BTreeSet<String>,
  kinds: BTreeSet<String>,
}

impl TypeRegistry {
  pub fn new() -> Self { Self::default() }

  pub fn register_verb<V: VerbKind>(&mut self) -> &mut Self {
    self.verbs.insert(V::NAME.to_owned());
    self
  }

  /// Register a verb known only by name, e.g. one loaded from configuration.
  pub fn register_verb_name(&mut self, name: impl Into<String>) -> &mut Self {
    self.verbs.insert(name.into());
    self
  }

  pub fn register_kind<E: Entity>(&mut self) -> &mut Self {
    self.kinds.insert(E::KIND.to_owned());
    self
  }

  /// Resolve a stored verb name back to a [`Verb`].
  pub fn resolve_verb(&self, name: &str) -> Result<Verb> {
    if self.verbs.contains(name) {
      Ok(Verb::named(name))
    } else {
      Err(Error::UnresolvableType(name.to_owned()))
    }
  }

  /// Fail if `entity` carries a kind nobody registered.
  pub fn check_kind(&self, entity: &EntityRef) -> Result<()> {
    if self.kinds.contains(&entity.kind) {
      Ok(())
    } else {
      Err(Error::UnresolvableType(entity.kind.clone()))
    }
  }

  pub fn verbs(&self) -> impl Iterator<Item = &str> { self.verbs.iter().map(String::as_str) }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Follow;

  impl VerbKind for Follow {
    const NAME: &'static str = "follow";
  }

  struct Thing;

  impl Entity for Thing {
    const KIND: &'static str = "thing";

    fn entity_id(&self) -> i64 { 1 }
  }

  #[test]
  fn registered_verb_resolves() {
    let mut reg = TypeRegistry::new();
    reg.register_verb::<Follow>();

    let verb = reg.resolve_verb("follow").unwrap();
    assert_eq!(verb, Verb::of::<Follow>());
    assert!(verb.is::<Follow>());
  }

  #[test]
  fn renamed_verb_is_unresolvable() {
    let mut reg = TypeRegistry::new();
    reg.register_verb_name("befriend");

    let err = reg.resolve_verb("follow").unwrap_err();
    assert!(matches!(err, Error::UnresolvableType(n) if n == "follow"));
  }

  #[test]
  fn check_kind() {
    let mut reg = TypeRegistry::new();
    reg.register_kind::<Thing>();

    assert!(reg.check_kind(&Thing.entity_ref()).is_ok());
    assert!(matches!(
      reg.check_kind(&EntityRef::new("person", 1)),
      Err(Error::UnresolvableType(_))
    ));
  }
}
