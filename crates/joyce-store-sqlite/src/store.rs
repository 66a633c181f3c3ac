//! [`SqliteStore`] — the SQLite implementation of [`ActivityStore`].

use std::{collections::HashSet, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use joyce_core::{
  activity::{Activity, ActivityTarget, NewActivity, Targets},
  entity::EntityRef,
  store::ActivityStore,
  stream::{Stream, StreamSubscriber},
};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ACTIVITY_COLUMNS, RawActivity, RawStream, RawSubscription, RawTarget, STREAM_COLUMNS,
    SUBSCRIPTION_COLUMNS, decode_dt, encode_dt, encode_entity_opt, encode_uuid, truncate_dt,
  },
  schema::SCHEMA,
  settings::StoreConfig,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Joyce activity store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path.as_ref(), None).await
  }

  /// Open the store described by `config`, applying its busy timeout.
  pub async fn open_with_config(config: &StoreConfig) -> Result<Self> {
    let path = config.resolved_store_path();
    Self::open_with(&path, Some(Duration::from_millis(config.busy_timeout_ms))).await
  }

  /// The busy timeout must be in place before the schema runs: the schema
  /// takes a write lock.
  async fn open_with(path: &Path, busy_timeout: Option<Duration>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    if let Some(timeout) = busy_timeout {
      conn
        .call(move |conn| {
          conn.busy_timeout(timeout)?;
          Ok(())
        })
        .await?;
    }

    let store = Self { conn };
    store.init_schema().await?;
    tracing::info!(path = %path.display(), ?busy_timeout, "opened activity store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Whether `sql` (selecting by a single UUID parameter) returns a row.
  async fn exists(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id_str], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;

    Ok(found)
  }

  async fn activity_exists(&self, id: Uuid) -> Result<bool> {
    self.exists("SELECT 1 FROM activities WHERE activity_id = ?1", id).await
  }

  async fn stream_exists(&self, id: Uuid) -> Result<bool> {
    self.exists("SELECT 1 FROM streams WHERE stream_id = ?1", id).await
  }

  async fn query_activities(&self, sql: String, params: Vec<Value>) -> Result<Vec<Activity>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_activity).collect()
  }

  async fn query_streams(&self, sql: String, params: Vec<Value>) -> Result<Vec<Stream>> {
    let raws: Vec<RawStream> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawStream::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStream::into_stream).collect()
  }

  async fn query_subscriptions(
    &self,
    sql: String,
    params: Vec<Value>,
  ) -> Result<Vec<StreamSubscriber>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }
}

fn uuid_value(id: Uuid) -> Value { Value::Text(encode_uuid(id)) }

fn opt_text(s: Option<String>) -> Value { s.map_or(Value::Null, Value::Text) }

// ─── ActivityStore impl ──────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  type Error = Error;

  // ── Activities ────────────────────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
    let (actor, object, verb) = input.into_parts()?;

    let activity = Activity {
      activity_id: Uuid::new_v4(),
      actor,
      object,
      verb,
      created_at: truncate_dt(Utc::now()),
    };

    let id_str                   = encode_uuid(activity.activity_id);
    let actor_type               = activity.actor.kind.clone();
    let actor_id                 = activity.actor.id;
    let (object_type, object_id) = encode_entity_opt(activity.object.as_ref());
    let verb_str                 = activity.verb.clone();
    let at                       = encode_dt(activity.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (
             activity_id, actor_type, actor_id, object_type, object_id, verb, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, actor_type, actor_id, object_type, object_id, verb_str, at],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(
      activity_id = %activity.activity_id,
      actor = %activity.actor,
      verb = %activity.verb,
      "recorded activity"
    );
    Ok(activity)
  }

  async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>> {
    let sql = format!("SELECT {ACTIVITY_COLUMNS} FROM activities a WHERE a.activity_id = ?1");
    let mut found = self.query_activities(sql, vec![uuid_value(id)]).await?;
    Ok(found.pop())
  }

  // ── Targets ───────────────────────────────────────────────────────────────

  async fn set_targets(&self, activity_id: Uuid, targets: Targets) -> Result<Vec<ActivityTarget>> {
    if !self.activity_exists(activity_id).await? {
      return Err(Error::ActivityNotFound(activity_id));
    }

    let rows: Vec<ActivityTarget> = targets
      .iter()
      .map(|(name, target)| ActivityTarget {
        activity_target_id: Uuid::new_v4(),
        activity_id,
        name: name.to_owned(),
        target: target.clone(),
      })
      .collect();

    let encoded: Vec<(String, String, String, String, i64)> = rows
      .iter()
      .map(|t| {
        (
          encode_uuid(t.activity_target_id),
          encode_uuid(t.activity_id),
          t.name.clone(),
          t.target.kind.clone(),
          t.target.id,
        )
      })
      .collect();

    // One transaction per call: either every row lands or none does.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO activities_targets (
               activity_target_id, activity_id, name, target_type, target_id
             ) VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (row_id, act_id, name, target_type, target_id) in &encoded {
            stmt.execute(rusqlite::params![row_id, act_id, name, target_type, target_id])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(%activity_id, count = rows.len(), "set activity targets");
    Ok(rows)
  }

  async fn get_targets(&self, activity_id: Uuid, name: String) -> Result<Vec<EntityRef>> {
    let id_str = encode_uuid(activity_id);

    let targets = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT target_type, target_id FROM activities_targets
           WHERE activity_id = ?1 AND name = ?2
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, name], |row| {
            Ok(EntityRef { kind: row.get(0)?, id: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(targets)
  }

  async fn list_targets(&self, activity_id: Uuid) -> Result<Vec<ActivityTarget>> {
    let id_str = encode_uuid(activity_id);

    let raws: Vec<RawTarget> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT activity_target_id, activity_id, name, target_type, target_id
           FROM activities_targets
           WHERE activity_id = ?1
           ORDER BY seq",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawTarget::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTarget::into_target).collect()
  }

  async fn activities_targeting(
    &self,
    target: EntityRef,
    name: Option<String>,
  ) -> Result<Vec<Activity>> {
    let sql = format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activities a
       WHERE a.activity_id IN (
         SELECT t.activity_id FROM activities_targets t
         WHERE t.target_type = ?1 AND t.target_id = ?2
           AND (?3 IS NULL OR t.name = ?3)
       )
       ORDER BY a.created_at, a.rowid"
    );
    let params = vec![Value::Text(target.kind), Value::Integer(target.id), opt_text(name)];
    self.query_activities(sql, params).await
  }

  // ── Streams ───────────────────────────────────────────────────────────────

  async fn create_stream(&self, owner: Option<EntityRef>, name: Option<String>) -> Result<Stream> {
    let stream = Stream {
      stream_id: Uuid::new_v4(),
      owner,
      name,
      created_at: truncate_dt(Utc::now()),
    };

    let id_str                 = encode_uuid(stream.stream_id);
    let (owner_type, owner_id) = encode_entity_opt(stream.owner.as_ref());
    let name                   = stream.name.clone();
    let at                     = encode_dt(stream.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO streams (stream_id, owner_type, owner_id, name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, owner_type, owner_id, name, at],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(stream_id = %stream.stream_id, owner = ?stream.owner, name = ?stream.name, "created stream");
    Ok(stream)
  }

  async fn get_stream(&self, id: Uuid) -> Result<Option<Stream>> {
    let sql = format!("SELECT {STREAM_COLUMNS} FROM streams s WHERE s.stream_id = ?1");
    let mut found = self.query_streams(sql, vec![uuid_value(id)]).await?;
    Ok(found.pop())
  }

  async fn find_stream(
    &self,
    owner: Option<EntityRef>,
    name: Option<String>,
  ) -> Result<Option<Stream>> {
    // `IS` compares NULLs as equal, so a missing owner or name matches only
    // a missing owner or name.
    let sql = format!(
      "SELECT {STREAM_COLUMNS} FROM streams s
       WHERE s.owner_type IS ?1 AND s.owner_id IS ?2 AND s.name IS ?3
       ORDER BY s.created_at, s.rowid
       LIMIT 1"
    );
    let (owner_type, owner_id) = encode_entity_opt(owner.as_ref());
    let params = vec![opt_text(owner_type), owner_id.map_or(Value::Null, Value::Integer), opt_text(name)];

    let mut found = self.query_streams(sql, params).await?;
    Ok(found.pop())
  }

  async fn streams_owned_by(&self, owner: EntityRef) -> Result<Vec<Stream>> {
    let sql = format!(
      "SELECT {STREAM_COLUMNS} FROM streams s
       WHERE s.owner_type = ?1 AND s.owner_id = ?2
       ORDER BY s.created_at, s.rowid"
    );
    self
      .query_streams(sql, vec![Value::Text(owner.kind), Value::Integer(owner.id)])
      .await
  }

  async fn streams_of_activity(&self, activity_id: Uuid) -> Result<Vec<Stream>> {
    let sql = format!(
      "SELECT {STREAM_COLUMNS} FROM streams s
       JOIN activities_streams j ON j.stream_id = s.stream_id
       WHERE j.activity_id = ?1
       ORDER BY j.seq"
    );
    self.query_streams(sql, vec![uuid_value(activity_id)]).await
  }

  async fn add_to_stream(&self, stream_id: Uuid, activity_id: Uuid) -> Result<()> {
    if !self.stream_exists(stream_id).await? {
      return Err(Error::StreamNotFound(stream_id));
    }
    if !self.activity_exists(activity_id).await? {
      return Err(Error::ActivityNotFound(activity_id));
    }

    let stream_str   = encode_uuid(stream_id);
    let activity_str = encode_uuid(activity_id);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO activities_streams (activity_id, stream_id) VALUES (?1, ?2)",
          rusqlite::params![activity_str, stream_str],
        )?)
      })
      .await?;

    tracing::debug!(%stream_id, %activity_id, already_member = inserted == 0, "added activity to stream");
    Ok(())
  }

  async fn remove_from_stream(&self, stream_id: Uuid, activity_id: Uuid) -> Result<bool> {
    let stream_str   = encode_uuid(stream_id);
    let activity_str = encode_uuid(activity_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM activities_streams WHERE activity_id = ?1 AND stream_id = ?2",
          rusqlite::params![activity_str, stream_str],
        )?)
      })
      .await?;

    tracing::debug!(%stream_id, %activity_id, removed = deleted > 0, "removed activity from stream");
    Ok(deleted > 0)
  }

  async fn stream_activities(&self, stream_id: Uuid) -> Result<Vec<Activity>> {
    let sql = format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activities a
       JOIN activities_streams j ON j.activity_id = a.activity_id
       WHERE j.stream_id = ?1
       ORDER BY j.seq"
    );
    self.query_activities(sql, vec![uuid_value(stream_id)]).await
  }

  // ── Owner views ───────────────────────────────────────────────────────────

  async fn owner_activity_stream(
    &self,
    owner: EntityRef,
    name: Option<String>,
  ) -> Result<Vec<Activity>> {
    // An activity in several owned streams is listed once, at the position
    // of its first membership.
    let sql = format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activities a
       JOIN activities_streams j ON j.activity_id = a.activity_id
       JOIN streams s            ON s.stream_id   = j.stream_id
       WHERE s.owner_type = ?1 AND s.owner_id = ?2
         AND (?3 IS NULL OR s.name = ?3)
       GROUP BY a.activity_id
       ORDER BY MIN(j.seq)"
    );
    let params = vec![Value::Text(owner.kind), Value::Integer(owner.id), opt_text(name)];
    self.query_activities(sql, params).await
  }

  async fn actor_kind_activity_stream(&self, kind: String) -> Result<Vec<Activity>> {
    let sql = format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activities a
       WHERE a.actor_type = ?1
       ORDER BY a.created_at, a.rowid"
    );
    self.query_activities(sql, vec![Value::Text(kind)]).await
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn subscribe(
    &self,
    stream_id: Uuid,
    subscriber: EntityRef,
    started_at: Option<DateTime<Utc>>,
  ) -> Result<StreamSubscriber> {
    if !self.stream_exists(stream_id).await? {
      return Err(Error::StreamNotFound(stream_id));
    }

    let subscription = StreamSubscriber {
      subscription_id: Uuid::new_v4(),
      stream_id,
      subscriber,
      started_at: truncate_dt(started_at.unwrap_or_else(Utc::now)),
      ended_at: None,
    };

    let id_str          = encode_uuid(subscription.subscription_id);
    let stream_str      = encode_uuid(stream_id);
    let subscriber_type = subscription.subscriber.kind.clone();
    let subscriber_id   = subscription.subscriber.id;
    let at              = encode_dt(subscription.started_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO streams_subscribers (
             subscription_id, stream_id, subscriber_type, subscriber_id, started_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, stream_str, subscriber_type, subscriber_id, at],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(
      subscription_id = %subscription.subscription_id,
      %stream_id,
      subscriber = %subscription.subscriber,
      "subscribed to stream"
    );
    Ok(subscription)
  }

  async fn end_subscription(
    &self,
    subscription_id: Uuid,
    ended_at: Option<DateTime<Utc>>,
  ) -> Result<StreamSubscriber> {
    let ended_at = truncate_dt(ended_at.unwrap_or_else(Utc::now));
    let id_str   = encode_uuid(subscription_id);
    let at       = encode_dt(ended_at);

    // Update and read-back run in one transaction; only one end can match
    // `ended_at IS NULL`.
    let (updated, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE streams_subscribers SET ended_at = ?2
           WHERE subscription_id = ?1 AND ended_at IS NULL AND started_at <= ?2",
          rusqlite::params![id_str, at],
        )?;
        let raw = tx
          .query_row(
            &format!(
              "SELECT {SUBSCRIPTION_COLUMNS} FROM streams_subscribers ss
               WHERE ss.subscription_id = ?1"
            ),
            rusqlite::params![id_str],
            RawSubscription::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok((updated > 0, raw))
      })
      .await?;

    let raw = raw.ok_or(Error::SubscriptionNotFound(subscription_id))?;
    if !updated {
      if raw.ended_at.is_some() {
        return Err(Error::SubscriptionEnded(subscription_id));
      }
      let started_at = decode_dt(raw.started_at)?;
      return Err(
        joyce_core::Error::InvalidArgument(format!(
          "subscription {subscription_id} cannot end at {ended_at} before it started at {started_at}"
        ))
        .into(),
      );
    }

    tracing::debug!(%subscription_id, %ended_at, "ended subscription");
    raw.into_subscription()
  }

  async fn subscriptions_to(&self, stream_id: Uuid) -> Result<Vec<StreamSubscriber>> {
    let sql = format!(
      "SELECT {SUBSCRIPTION_COLUMNS} FROM streams_subscribers ss
       WHERE ss.stream_id = ?1
       ORDER BY ss.started_at, ss.rowid"
    );
    self.query_subscriptions(sql, vec![uuid_value(stream_id)]).await
  }

  async fn subscriptions_of(&self, subscriber: EntityRef) -> Result<Vec<StreamSubscriber>> {
    let sql = format!(
      "SELECT {SUBSCRIPTION_COLUMNS} FROM streams_subscribers ss
       WHERE ss.subscriber_type = ?1 AND ss.subscriber_id = ?2
       ORDER BY ss.started_at, ss.rowid"
    );
    self
      .query_subscriptions(sql, vec![Value::Text(subscriber.kind), Value::Integer(subscriber.id)])
      .await
  }

  async fn subscribers(&self, activity_id: Uuid, distinct: bool) -> Result<Vec<EntityRef>> {
    let id_str = encode_uuid(activity_id);

    // The window condition is `StreamSubscriber::covers` on `a.created_at`.
    let mut subscribers: Vec<EntityRef> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ss.subscriber_type, ss.subscriber_id
           FROM streams_subscribers ss
           JOIN activities_streams j ON j.stream_id   = ss.stream_id
           JOIN activities a         ON a.activity_id = j.activity_id
           WHERE a.activity_id = ?1
             AND a.created_at >= ss.started_at
             AND (ss.ended_at IS NULL OR a.created_at <= ss.ended_at)
           ORDER BY j.seq, ss.started_at, ss.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(EntityRef { kind: row.get(0)?, id: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    if distinct {
      let mut seen = HashSet::new();
      subscribers.retain(|s| seen.insert(s.clone()));
    }

    Ok(subscribers)
  }
}
