//! Encoding and decoding helpers between Rust domain types and the values
//! stored in SQLite columns.
//!
//! Timestamps are stored as integer microseconds since the Unix epoch. UUIDs
//! are stored as hyphenated lowercase strings. Entity references are split
//! across a `*_type` / `*_id` column pair.

use chrono::{DateTime, SubsecRound as _, Utc};
use joyce_core::{
  activity::{Activity, ActivityTarget},
  entity::EntityRef,
  stream::{Stream, StreamSubscriber},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Microseconds since the Unix epoch. Every `DateTime<Utc>` chrono can
/// represent fits in an `i64` at this precision, so SQL integer comparison
/// is chronological over the whole range.
pub fn encode_dt(dt: DateTime<Utc>) -> i64 { dt.timestamp_micros() }

pub fn decode_dt(micros: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros)
    .ok_or_else(|| Error::DateParse(format!("timestamp out of range: {micros}us")))
}

/// Truncate to the precision the store keeps. Values returned from a write
/// must equal what a later read returns.
pub fn truncate_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

// ─── EntityRef ───────────────────────────────────────────────────────────────

pub fn decode_entity_opt(
  column: &str,
  kind: Option<String>,
  id: Option<i64>,
) -> Result<Option<EntityRef>> {
  match (kind, id) {
    (Some(kind), Some(id)) => Ok(Some(EntityRef { kind, id })),
    (None, None) => Ok(None),
    _ => Err(Error::Corrupt(format!("{column}: type and id must both be set or both be NULL"))),
  }
}

/// `(type, id)` columns for an optional reference.
pub fn encode_entity_opt(entity: Option<&EntityRef>) -> (Option<String>, Option<i64>) {
  match entity {
    Some(e) => (Some(e.kind.clone()), Some(e.id)),
    None => (None, None),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawActivity::from_row`], for a table aliased `a`.
pub const ACTIVITY_COLUMNS: &str =
  "a.activity_id, a.actor_type, a.actor_id, a.object_type, a.object_id, a.verb, a.created_at";

/// Raw values read directly from an `activities` row.
pub struct RawActivity {
  pub activity_id: String,
  pub actor_type:  String,
  pub actor_id:    i64,
  pub object_type: Option<String>,
  pub object_id:   Option<i64>,
  pub verb:        String,
  pub created_at:  i64,
}

impl RawActivity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_id: row.get(0)?,
      actor_type:  row.get(1)?,
      actor_id:    row.get(2)?,
      object_type: row.get(3)?,
      object_id:   row.get(4)?,
      verb:        row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      activity_id: decode_uuid(&self.activity_id)?,
      actor:       EntityRef { kind: self.actor_type, id: self.actor_id },
      object:      decode_entity_opt("object", self.object_type, self.object_id)?,
      verb:        self.verb,
      created_at:  decode_dt(self.created_at)?,
    })
  }
}

/// Column list matching [`RawStream::from_row`], for a table aliased `s`.
pub const STREAM_COLUMNS: &str = "s.stream_id, s.owner_type, s.owner_id, s.name, s.created_at";

/// Raw values read directly from a `streams` row.
pub struct RawStream {
  pub stream_id:  String,
  pub owner_type: Option<String>,
  pub owner_id:   Option<i64>,
  pub name:       Option<String>,
  pub created_at: i64,
}

impl RawStream {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      stream_id:  row.get(0)?,
      owner_type: row.get(1)?,
      owner_id:   row.get(2)?,
      name:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_stream(self) -> Result<Stream> {
    Ok(Stream {
      stream_id:  decode_uuid(&self.stream_id)?,
      owner:      decode_entity_opt("owner", self.owner_type, self.owner_id)?,
      name:       self.name,
      created_at: decode_dt(self.created_at)?,
    })
  }
}

/// Column list matching [`RawSubscription::from_row`], for a table aliased
/// `ss`.
pub const SUBSCRIPTION_COLUMNS: &str =
  "ss.subscription_id, ss.stream_id, ss.subscriber_type, ss.subscriber_id, ss.started_at, ss.ended_at";

/// Raw values read directly from a `streams_subscribers` row.
pub struct RawSubscription {
  pub subscription_id: String,
  pub stream_id:       String,
  pub subscriber_type: String,
  pub subscriber_id:   i64,
  pub started_at:      i64,
  pub ended_at:        Option<i64>,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id: row.get(0)?,
      stream_id:       row.get(1)?,
      subscriber_type: row.get(2)?,
      subscriber_id:   row.get(3)?,
      started_at:      row.get(4)?,
      ended_at:        row.get(5)?,
    })
  }

  pub fn into_subscription(self) -> Result<StreamSubscriber> {
    Ok(StreamSubscriber {
      subscription_id: decode_uuid(&self.subscription_id)?,
      stream_id:       decode_uuid(&self.stream_id)?,
      subscriber:      EntityRef { kind: self.subscriber_type, id: self.subscriber_id },
      started_at:      decode_dt(self.started_at)?,
      ended_at:        self.ended_at.map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from an `activities_targets` row.
pub struct RawTarget {
  pub activity_target_id: String,
  pub activity_id:        String,
  pub name:               String,
  pub target_type:        String,
  pub target_id:          i64,
}

impl RawTarget {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_target_id: row.get(0)?,
      activity_id:        row.get(1)?,
      name:               row.get(2)?,
      target_type:        row.get(3)?,
      target_id:          row.get(4)?,
    })
  }

  pub fn into_target(self) -> Result<ActivityTarget> {
    Ok(ActivityTarget {
      activity_target_id: decode_uuid(&self.activity_target_id)?,
      activity_id:        decode_uuid(&self.activity_id)?,
      name:               self.name,
      target:             EntityRef { kind: self.target_type, id: self.target_id },
    })
  }
}
