use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub mod json_file;
pub mod models;
use models::*;

/// Alert journal: every halftime alert that went out, keyed by operating day.
///
/// Backs the daily recap; the live path never reads from it.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another holder panicked; the
        // connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Alerts ───────────────────────────────────────────────────────────────

    /// Record an alert line that was handed to the notifier
    pub fn insert_alert(&self, alert: &AlertRecord) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO alerts (operating_date, event_id, matchup, kind, body, sent_at)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                alert.operating_date,
                alert.event_id,
                alert.matchup,
                alert.kind.as_str(),
                alert.body,
                alert.sent_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All alerts for one operating day, oldest first
    pub fn list_alerts_for_date(&self, date: NaiveDate) -> Result<Vec<AlertRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, operating_date, event_id, matchup, kind, body, sent_at
             FROM alerts WHERE operating_date = ?1 ORDER BY sent_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map(params![date], map_alert)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_alert(row: &rusqlite::Row) -> rusqlite::Result<AlertRecord> {
    let kind: String = row.get(4)?;
    Ok(AlertRecord {
        id: row.get(0)?,
        operating_date: row.get(1)?,
        event_id: row.get(2)?,
        matchup: row.get(3)?,
        kind: AlertKind::from_str_lossy(&kind),
        body: row.get(5)?,
        sent_at: row.get(6)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS alerts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    operating_date  TEXT    NOT NULL,
    event_id        TEXT    NOT NULL,
    matchup         TEXT    NOT NULL,
    kind            TEXT    NOT NULL,
    body            TEXT    NOT NULL,
    sent_at         TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_alerts_date ON alerts(operating_date);
"#;
