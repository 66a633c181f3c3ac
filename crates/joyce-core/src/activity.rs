//! Activities and their named targets.
//!
//! An activity records that an actor performed a verb, optionally on an
//! object. Once written it is never updated; only its stream memberships and
//! target rows change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::EntityRef,
  registry::{TypeRegistry, Verb},
};

/// Target name used when the caller does not pick one.
pub const DEFAULT_TARGET_NAME: &str = "target";

// ─── Activity ────────────────────────────────────────────────────────────────

/// A persisted activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
  pub activity_id: Uuid,
  pub actor:       EntityRef,
  pub object:      Option<EntityRef>,
  /// Canonical verb name as stored. Use [`Activity::verb`] to resolve it.
  pub verb:        String,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at:  DateTime<Utc>,
}

impl Activity {
  pub fn verb_name(&self) -> &str { &self.verb }

  /// Resolve the stored verb name against `registry`.
  pub fn verb(&self, registry: &TypeRegistry) -> Result<Verb> {
    registry.resolve_verb(&self.verb)
  }
}

// ─── NewActivity ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ActivityStore::record_activity`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
  pub actor:  Option<EntityRef>,
  pub object: Option<EntityRef>,
  verb:       Option<String>,
}

impl NewActivity {
  pub fn new(actor: EntityRef, verb: Verb) -> Self {
    Self { actor: Some(actor), object: None, verb: Some(verb.into_name()) }
  }

  pub fn with_object(mut self, object: EntityRef) -> Self {
    self.object = Some(object);
    self
  }

  /// Store `verb` by its canonical name; `None` clears it.
  pub fn set_verb(&mut self, verb: Option<Verb>) { self.verb = verb.map(Verb::into_name); }

  pub fn verb_name(&self) -> Option<&str> { self.verb.as_deref() }

  pub fn verb(&self, registry: &TypeRegistry) -> Result<Option<Verb>> {
    self.verb.as_deref().map(|v| registry.resolve_verb(v)).transpose()
  }

  /// Check the fields that must be present before the activity is persisted.
  pub fn validate(&self) -> Result<()> {
    if self.actor.is_none() {
      return Err(Error::RequiredFieldMissing("actor"));
    }
    if self.verb.is_none() {
      return Err(Error::RequiredFieldMissing("verb"));
    }
    Ok(())
  }

  /// Validate and split into `(actor, object, verb)`.
  pub fn into_parts(self) -> Result<(EntityRef, Option<EntityRef>, String)> {
    let actor = self.actor.ok_or(Error::RequiredFieldMissing("actor"))?;
    let verb = self.verb.ok_or(Error::RequiredFieldMissing("verb"))?;
    Ok((actor, self.object, verb))
  }
}

// ─── Targets ─────────────────────────────────────────────────────────────────

/// One persisted named edge from an activity to an auxiliary entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTarget {
  pub activity_target_id: Uuid,
  pub activity_id:        Uuid,
  pub name:               String,
  pub target:             EntityRef,
}

/// The value side of a [`Targets`] entry: one entity or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
  One(EntityRef),
  Many(Vec<EntityRef>),
}

impl TargetValue {
  pub fn entities(&self) -> &[EntityRef] {
    match self {
      Self::One(e) => std::slice::from_ref(e),
      Self::Many(es) => es,
    }
  }
}

impl From<EntityRef> for TargetValue {
  fn from(e: EntityRef) -> Self { Self::One(e) }
}

impl From<Vec<EntityRef>> for TargetValue {
  fn from(es: Vec<EntityRef>) -> Self { Self::Many(es) }
}

/// A mapping of target name to one or more entities, as accepted by
/// [`crate::store::ActivityStore::set_targets`].
///
/// Entries keep the order they were added in. Names may repeat; nothing is
/// deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
  entries: Vec<(String, TargetValue)>,
}

impl Targets {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<TargetValue>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TargetValue>) {
    self.entries.push((name.into(), value.into()));
  }

  /// Every `(name, entity)` pair, one per row to be written.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityRef)> {
    self
      .entries
      .iter()
      .flat_map(|(name, value)| value.entities().iter().map(move |e| (name.as_str(), e)))
  }

  pub fn is_empty(&self) -> bool { self.iter().next().is_none() }
}

impl TryFrom<serde_json::Value> for Targets {
  type Error = Error;

  /// Accepts only a JSON object of `name => entity | [entity, ...]`.
  fn try_from(value: serde_json::Value) -> Result<Self> {
    let serde_json::Value::Object(map) = value else {
      return Err(Error::InvalidArgument(format!(
        "targets must be a mapping of name => target, got {value}"
      )));
    };

    let mut targets = Targets::new();
    for (name, raw) in map {
      let value: TargetValue = serde_json::from_value(raw)
        .map_err(|e| Error::InvalidArgument(format!("target {name:?}: {e}")))?;
      targets.insert(name, value);
    }
    Ok(targets)
  }
}
