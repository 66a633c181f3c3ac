//! The `ActivityStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `joyce-store-sqlite`).
//! Host applications depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  activity::{Activity, ActivityTarget, NewActivity, Targets},
  entity::EntityRef,
  stream::{Stream, StreamSubscriber},
};

/// Abstraction over a Joyce activity store backend.
///
/// Activities are append-only. Only stream memberships, target rows and
/// subscription end times change after creation.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait ActivityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Activities ────────────────────────────────────────────────────────

  /// Validate and persist a new activity. `created_at` is set by the store.
  ///
  /// Fails with [`crate::Error::RequiredFieldMissing`] if the actor or the
  /// verb is missing.
  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Retrieve an activity by UUID. Returns `None` if not found.
  fn get_activity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Activity>, Self::Error>> + Send + '_;

  // ── Targets ───────────────────────────────────────────────────────────

  /// Write one target row per entity in `targets`.
  ///
  /// Existing rows are left alone, so repeated calls accumulate.
  fn set_targets(
    &self,
    activity_id: Uuid,
    targets: Targets,
  ) -> impl Future<Output = Result<Vec<ActivityTarget>, Self::Error>> + Send + '_;

  /// Target entities filed under `name`, in insertion order.
  fn get_targets(
    &self,
    activity_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Vec<EntityRef>, Self::Error>> + Send + '_;

  /// Every target row of an activity, across all names.
  fn list_targets(
    &self,
    activity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ActivityTarget>, Self::Error>> + Send + '_;

  /// Activities in which `target` appears as a target, optionally only under
  /// `name`. Oldest first, each activity once.
  fn activities_targeting(
    &self,
    target: EntityRef,
    name: Option<String>,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Streams ───────────────────────────────────────────────────────────

  /// Create a stream. `owner = None` creates a global stream.
  fn create_stream(
    &self,
    owner: Option<EntityRef>,
    name: Option<String>,
  ) -> impl Future<Output = Result<Stream, Self::Error>> + Send + '_;

  fn get_stream(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Stream>, Self::Error>> + Send + '_;

  /// The oldest stream matching `owner` and `name` exactly (`None` matches
  /// only a missing owner or name). Never creates one.
  fn find_stream(
    &self,
    owner: Option<EntityRef>,
    name: Option<String>,
  ) -> impl Future<Output = Result<Option<Stream>, Self::Error>> + Send + '_;

  fn streams_owned_by(
    &self,
    owner: EntityRef,
  ) -> impl Future<Output = Result<Vec<Stream>, Self::Error>> + Send + '_;

  fn streams_of_activity(
    &self,
    activity_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Stream>, Self::Error>> + Send + '_;

  /// Add an activity to a stream. Adding it twice is a no-op.
  fn add_to_stream(
    &self,
    stream_id: Uuid,
    activity_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drop a membership. Returns `false` if the activity was not in the stream.
  fn remove_from_stream(
    &self,
    stream_id: Uuid,
    activity_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Activities of one stream in the order they were added.
  fn stream_activities(
    &self,
    stream_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Owner views ───────────────────────────────────────────────────────

  /// Activities of every stream owned by `owner` (or only the stream called
  /// `name`), in membership order without duplicates.
  fn owner_activity_stream(
    &self,
    owner: EntityRef,
    name: Option<String>,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  /// Activities whose actor is of exactly `kind`, oldest first.
  fn actor_kind_activity_stream(
    &self,
    kind: String,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// Subscribe `subscriber` to a stream from `started_at` (defaults to now).
  fn subscribe(
    &self,
    stream_id: Uuid,
    subscriber: EntityRef,
    started_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<StreamSubscriber, Self::Error>> + Send + '_;

  /// Close an open subscription at `ended_at` (defaults to now).
  fn end_subscription(
    &self,
    subscription_id: Uuid,
    ended_at: Option<DateTime<Utc>>,
  ) -> impl Future<Output = Result<StreamSubscriber, Self::Error>> + Send + '_;

  fn subscriptions_to(
    &self,
    stream_id: Uuid,
  ) -> impl Future<Output = Result<Vec<StreamSubscriber>, Self::Error>> + Send + '_;

  fn subscriptions_of(
    &self,
    subscriber: EntityRef,
  ) -> impl Future<Output = Result<Vec<StreamSubscriber>, Self::Error>> + Send + '_;

  /// Subscribers whose window covers the activity's `created_at`, across every
  /// stream the activity belongs to.
  ///
  /// With `distinct = false` a subscriber qualifying through several
  /// subscriptions is listed once per subscription. With `distinct = true`
  /// only the first occurrence is kept.
  fn subscribers(
    &self,
    activity_id: Uuid,
    distinct: bool,
  ) -> impl Future<Output = Result<Vec<EntityRef>, Self::Error>> + Send + '_;
}
