//! Polymorphic references to host-application entities.
//!
//! Joyce never owns the actors, objects, targets, owners or subscribers it
//! talks about. It stores a `(kind, id)` pair and hands resolution back to the
//! host through [`EntityResolver`].

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── EntityRef ───────────────────────────────────────────────────────────────

/// A `(kind, id)` pair pointing at a row owned by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
  /// Host type tag, e.g. `"person"`. Matches [`Entity::KIND`].
  pub kind: String,
  pub id:   i64,
}

impl EntityRef {
  pub fn new(kind: impl Into<String>, id: i64) -> Self {
    Self { kind: kind.into(), id }
  }

  /// Whether this reference points at an instance of `E`.
  pub fn is<E: Entity>(&self) -> bool { self.kind == E::KIND }
}

impl fmt::Display for EntityRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}#{}", self.kind, self.id)
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// Implemented by host types that can appear in an activity, as actor,
/// object, target, stream owner or subscriber.
pub trait Entity {
  /// The type tag stored alongside the id.
  const KIND: &'static str;

  fn entity_id(&self) -> i64;

  fn entity_ref(&self) -> EntityRef { EntityRef::new(Self::KIND, self.entity_id()) }
}

impl<E: Entity> From<&E> for EntityRef {
  fn from(entity: &E) -> Self { entity.entity_ref() }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Host-provided loader turning a stored reference back into a live entity.
///
/// Implementations should fail with [`crate::Error::UnresolvableType`] when
/// the reference's kind is unknown to them.
pub trait EntityResolver {
  type Entity;
  type Error: From<crate::Error>;

  fn resolve(&self, entity: &EntityRef) -> Result<Self::Entity, Self::Error>;
}

/// Resolve every reference in `refs`, preserving order and duplicates.
pub fn resolve_all<R: EntityResolver>(
  resolver: &R,
  refs: &[EntityRef],
) -> Result<Vec<R::Entity>, R::Error> {
  refs.iter().map(|r| resolver.resolve(r)).collect()
}
