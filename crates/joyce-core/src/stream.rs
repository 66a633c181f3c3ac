//! Streams and time-bounded subscriptions to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityRef;

// ─── Stream ──────────────────────────────────────────────────────────────────

/// A named or anonymous bucket of activities.
///
/// A stream holds activities by reference only; removing a membership never
/// deletes the activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
  pub stream_id:  Uuid,
  /// `None` for a global stream.
  pub owner:      Option<EntityRef>,
  pub name:       Option<String>,
  pub created_at: DateTime<Utc>,
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// One entity observing one stream between `started_at` and `ended_at`.
///
/// The same subscriber may hold several overlapping subscriptions to the same
/// stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSubscriber {
  pub subscription_id: Uuid,
  pub stream_id:       Uuid,
  pub subscriber:      EntityRef,
  pub started_at:      DateTime<Utc>,
  /// `None` while the subscription is still open.
  pub ended_at:        Option<DateTime<Utc>>,
}

impl StreamSubscriber {
  /// Whether an activity created at `at` falls inside this subscription's
  /// window. Both bounds are inclusive.
  ///
  /// Stores evaluate the same condition when listing an activity's
  /// subscribers; this is the in-memory form for callers holding a
  /// subscription.
  pub fn covers(&self, at: DateTime<Utc>) -> bool {
    self.started_at <= at && self.ended_at.is_none_or(|end| at <= end)
  }

  pub fn is_open(&self) -> bool { self.ended_at.is_none() }
}
