//! SQL schema for the Joyce SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.
//!
//! Every polymorphic reference is a `*_type TEXT` / `*_id INTEGER` pair.
//! Timestamps are integer microseconds since the Unix epoch, so `<=` on them
//! orders chronologically for every representable date.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Activities are append-only; only memberships and targets change.
CREATE TABLE IF NOT EXISTS activities (
    activity_id  TEXT PRIMARY KEY,
    actor_type   TEXT NOT NULL,
    actor_id     INTEGER NOT NULL,
    object_type  TEXT,
    object_id    INTEGER,
    verb         TEXT NOT NULL,    -- canonical verb name
    created_at   INTEGER NOT NULL, -- server-assigned
    CHECK ((object_type IS NULL) = (object_id IS NULL))
);

CREATE TABLE IF NOT EXISTS streams (
    stream_id   TEXT PRIMARY KEY,
    owner_type  TEXT,              -- NULL for a global stream
    owner_id    INTEGER,
    name        TEXT,
    created_at  INTEGER NOT NULL,
    CHECK ((owner_type IS NULL) = (owner_id IS NULL))
);

-- Stream membership. `seq` records insertion order.
CREATE TABLE IF NOT EXISTS activities_streams (
    seq          INTEGER PRIMARY KEY AUTOINCREMENT,
    activity_id  TEXT NOT NULL REFERENCES activities(activity_id),
    stream_id    TEXT NOT NULL REFERENCES streams(stream_id),
    UNIQUE (activity_id, stream_id)
);

-- Named targets. Several rows may share (activity_id, name).
CREATE TABLE IF NOT EXISTS activities_targets (
    seq                 INTEGER PRIMARY KEY AUTOINCREMENT,
    activity_target_id  TEXT NOT NULL UNIQUE,
    activity_id         TEXT NOT NULL REFERENCES activities(activity_id),
    name                TEXT NOT NULL,
    target_type         TEXT NOT NULL,
    target_id           INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS streams_subscribers (
    subscription_id  TEXT PRIMARY KEY,
    stream_id        TEXT NOT NULL REFERENCES streams(stream_id),
    subscriber_type  TEXT NOT NULL,
    subscriber_id    INTEGER NOT NULL,
    started_at       INTEGER NOT NULL,
    ended_at         INTEGER,         -- NULL while still subscribed
    CHECK (ended_at IS NULL OR ended_at >= started_at)
);

CREATE INDEX IF NOT EXISTS activities_actor_idx     ON activities(actor_type, created_at);
CREATE INDEX IF NOT EXISTS streams_owner_idx        ON streams(owner_type, owner_id);
CREATE INDEX IF NOT EXISTS memberships_stream_idx   ON activities_streams(stream_id);
CREATE INDEX IF NOT EXISTS targets_activity_idx     ON activities_targets(activity_id, name);
CREATE INDEX IF NOT EXISTS targets_target_idx       ON activities_targets(target_type, target_id);
CREATE INDEX IF NOT EXISTS subscriptions_stream_idx ON streams_subscribers(stream_id);
CREATE INDEX IF NOT EXISTS subscriptions_subscriber_idx
    ON streams_subscribers(subscriber_type, subscriber_id);

PRAGMA user_version = 1;
";
