//! The owner capability: streams, activity streams and target lookups for any
//! host entity.
//!
//! A host type opts in with an empty `impl Owner for Thing {}` and then reaches
//! the capability through [`Owner::owner_streams`]:
//!
//! ```rust,ignore
//! let feed = thing.owner_streams().activity_stream(&store).await?;
//! let all_things = kind_activity_stream::<Thing, _>(&store).await?;
//! ```

use crate::{
  activity::Activity,
  entity::{Entity, EntityRef},
  store::ActivityStore,
  stream::Stream,
};

/// Marker for host types that own streams.
pub trait Owner: Entity {
  fn owner_streams(&self) -> OwnerStreams { OwnerStreams::new(self.entity_ref()) }
}

/// Stream operations bound to one owning entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerStreams {
  owner: EntityRef,
}

impl OwnerStreams {
  pub fn new(owner: EntityRef) -> Self { Self { owner } }

  pub fn owner(&self) -> &EntityRef { &self.owner }

  /// Streams owned by this entity, oldest first.
  pub async fn streams<S: ActivityStore>(&self, store: &S) -> Result<Vec<Stream>, S::Error> {
    store.streams_owned_by(self.owner.clone()).await
  }

  pub async fn create_stream<S: ActivityStore>(
    &self,
    store: &S,
    name: Option<String>,
  ) -> Result<Stream, S::Error> {
    store.create_stream(Some(self.owner.clone()), name).await
  }

  /// Activities across every stream this entity owns. Empty when it owns
  /// none.
  pub async fn activity_stream<S: ActivityStore>(
    &self,
    store: &S,
  ) -> Result<Vec<Activity>, S::Error> {
    store.owner_activity_stream(self.owner.clone(), None).await
  }

  /// Activities of the owned stream called `name` only.
  pub async fn named_activity_stream<S: ActivityStore>(
    &self,
    store: &S,
    name: impl Into<String>,
  ) -> Result<Vec<Activity>, S::Error> {
    store.owner_activity_stream(self.owner.clone(), Some(name.into())).await
  }

  /// Activities where this entity was tagged as a target.
  pub async fn targeted_in<S: ActivityStore>(
    &self,
    store: &S,
    name: Option<&str>,
  ) -> Result<Vec<Activity>, S::Error> {
    store.activities_targeting(self.owner.clone(), name.map(str::to_owned)).await
  }
}

/// Type-level activity stream: every activity whose actor is an `E`.
///
/// This filters on the actor's kind, not on stream ownership, so it can
/// differ from the union of every `E`'s [`OwnerStreams::activity_stream`].
pub async fn kind_activity_stream<E, S>(store: &S) -> Result<Vec<Activity>, S::Error>
where
  E: Entity,
  S: ActivityStore,
{
  store.actor_kind_activity_stream(E::KIND.to_owned()).await
}
