//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The desk calls store methods and never executes SQL directly.
//!
//! Every mutating method opens its own transaction and appends its audit
//! event before committing, so a mutation and its event land together or
//! not at all.

use crate::{
    error::{DeskError, DeskResult},
    event::{DeskEvent, EventLogEntry},
    types::UserId,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, types::Type, Connection};
use std::str::FromStr;

mod lead;
mod reference;
mod stats;
mod users;

pub use reference::{RefEntity, ReferenceRecord};
pub use stats::{DailyCount, UserLeadCounts};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Who performed a mutation, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub actor: UserId,
    pub at:    DateTime<Utc>,
}

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call on every open.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_users_teams.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_reference.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_leads.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (actor_id, event_type, batch_id, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.actor_id,
                entry.event_type,
                entry.batch_id,
                entry.payload,
                ts(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    /// Build and append the entry for `event` in one step.
    pub(crate) fn record(
        &self,
        stamp: Stamp,
        event: &DeskEvent,
        batch_id: Option<&str>,
    ) -> DeskResult<()> {
        let entry = EventLogEntry::new(stamp.actor, event, batch_id.map(String::from), stamp.at)?;
        self.append_event(&entry)
    }

    /// Most recent events first.
    pub fn recent_events(&self, limit: usize) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor_id, event_type, batch_id, payload, created_at
             FROM event_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    actor_id:   row.get(1)?,
                    event_type: row.get(2)?,
                    batch_id:   row.get(3)?,
                    payload:    row.get(4)?,
                    created_at: parse_ts(5, row.get(5)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn events_of_type(&self, event_type: &str) -> DeskResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ── Column helpers ─────────────────────────────────────────────

pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.format(TS_FORMAT).to_string()
}

pub(crate) fn date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&raw, TS_FORMAT)
        .map(|n| n.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parse_date(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a TEXT column into one of the crate's closed enums.
pub(crate) fn parse_enum<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Placeholder list for an `IN (...)` clause of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Map a UNIQUE violation to a field-level validation error.
pub(crate) fn unique_violation(err: rusqlite::Error, field: &str, message: &str) -> DeskError {
    match &err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("UNIQUE") =>
        {
            DeskError::validation(field, message)
        }
        _ => DeskError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn migrate_is_idempotent() {
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        assert!(store.recent_events(10).unwrap().is_empty());
    }

    #[test]
    fn timestamps_round_trip_at_second_precision() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 5).unwrap();
        assert_eq!(parse_ts(0, ts(&at)).unwrap(), at);
    }

    #[test]
    fn recorded_events_come_back_newest_first() {
        let store = DeskStore::in_memory().unwrap();
        store.migrate().unwrap();
        let stamp = Stamp {
            actor: 1,
            at: Utc.with_ymd_and_hms(2026, 10, 18, 7, 30, 5).unwrap(),
        };
        store
            .record(stamp, &DeskEvent::LeadsDeleted { lead_ids: vec![1] }, None)
            .unwrap();
        store
            .record(stamp, &DeskEvent::LeadsDeleted { lead_ids: vec![2] }, Some("b-1"))
            .unwrap();
        let events = store.recent_events(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].batch_id.as_deref(), Some("b-1"));
        assert_eq!(store.events_of_type("leads_deleted").unwrap(), 2);
    }
}
