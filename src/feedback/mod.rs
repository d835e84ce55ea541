//! Feedback store - per (ticket, solution level) success counters
//!
//! Counters live in one SQLite table whose layout is shared with earlier
//! deployments, so the schema below must not change. Every write is a single
//! upsert statement: concurrent sessions (threads or processes) never lose
//! increments and a failed write leaves the row untouched.

mod wilson;

pub use wilson::{wilson_lower_bound, DEFAULT_Z};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AssistError;
use crate::recency::{Clock, SystemClock};

/// How long a writer waits for a competing writer before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Timestamp layout of `last_updated` (naive UTC, microseconds)
const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS feedback (
    ticket_id TEXT,
    solution_level INTEGER,
    success_count INTEGER,
    attempt_count INTEGER,
    last_updated TEXT,
    PRIMARY KEY (ticket_id, solution_level)
)";

const UPSERT: &str = "INSERT INTO feedback VALUES (?1, ?2, ?3, 1, ?4)
    ON CONFLICT(ticket_id, solution_level)
    DO UPDATE SET
        success_count = success_count + excluded.success_count,
        attempt_count = attempt_count + 1,
        last_updated = excluded.last_updated";

/// Aggregated outcomes for one solution of one ticket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    pub ticket_id: String,
    pub level: u32,
    pub success_count: u64,
    pub attempt_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl FeedbackRecord {
    /// Record for a key nobody has rated yet
    pub fn zero(ticket_id: &str, level: u32) -> Self {
        Self {
            ticket_id: ticket_id.to_string(),
            level,
            success_count: 0,
            attempt_count: 0,
            last_updated: None,
        }
    }
}

/// Anything that can score how much a solution level is trusted
pub trait ConfidenceSource {
    fn confidence(&self, ticket_id: &str, level: u32) -> Result<f64, AssistError>;
}

/// SQLite-backed feedback counters
///
/// Cheap to clone; every operation opens its own connection so clones can be
/// handed to independent sessions.
#[derive(Clone)]
pub struct FeedbackStore {
    db_path: PathBuf,
    clock: Arc<dyn Clock>,
    z: f64,
}

impl std::fmt::Debug for FeedbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackStore")
            .field("db_path", &self.db_path)
            .field("z", &self.z)
            .finish()
    }
}

impl FeedbackStore {
    /// Open (creating if needed) the feedback database at `db_path`
    ///
    /// The parent directory must already exist.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, AssistError> {
        Self::open_with(db_path, Arc::new(SystemClock), DEFAULT_Z)
    }

    /// Open with an explicit clock and Wilson z
    pub fn open_with<P: AsRef<Path>>(
        db_path: P,
        clock: Arc<dyn Clock>,
        z: f64,
    ) -> Result<Self, AssistError> {
        let db_path = db_path.as_ref().to_path_buf();
        let store = Self { db_path, clock, z };
        let conn = store.connect()?;
        // WAL lets readers proceed while another session is writing
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute(SCHEMA, [])?;
        debug!(path = %store.db_path.display(), "feedback store ready");

        Ok(store)
    }

    fn connect(&self) -> Result<Connection, AssistError> {
        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Count one attempt, and one success if `succeeded`
    ///
    /// Creates the row on first use. Runs as one atomic statement.
    pub fn record_outcome(
        &self,
        ticket_id: &str,
        level: u32,
        succeeded: bool,
    ) -> Result<(), AssistError> {
        let now = self
            .clock
            .now()
            .naive_utc()
            .format(LAST_UPDATED_FORMAT)
            .to_string();

        let conn = self.connect()?;
        conn.execute(UPSERT, params![ticket_id, level, succeeded as i64, now])
            .map_err(|e| {
                warn!(ticket_id, level, error = %e, "feedback write failed");
                AssistError::StorageFailure(e)
            })?;

        debug!(ticket_id, level, succeeded, "feedback recorded");
        Ok(())
    }

    /// Stored counters, or the zero record when the key was never rated
    pub fn record(&self, ticket_id: &str, level: u32) -> Result<FeedbackRecord, AssistError> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT success_count, attempt_count, last_updated FROM feedback
                 WHERE ticket_id = ?1 AND solution_level = ?2",
                params![ticket_id, level],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<i64>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(match row {
            Some((success, attempts, last_updated)) => {
                let attempt_count = attempts.unwrap_or(0).max(0) as u64;
                FeedbackRecord {
                    ticket_id: ticket_id.to_string(),
                    level,
                    success_count: (success.unwrap_or(0).max(0) as u64).min(attempt_count),
                    attempt_count,
                    last_updated: last_updated.as_deref().and_then(parse_last_updated),
                }
            }
            None => FeedbackRecord::zero(ticket_id, level),
        })
    }

    /// All rated levels of one ticket, ascending by level
    pub fn records_for_ticket(&self, ticket_id: &str) -> Result<Vec<FeedbackRecord>, AssistError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT solution_level FROM feedback WHERE ticket_id = ?1 ORDER BY solution_level",
        )?;
        let levels = stmt
            .query_map(params![ticket_id], |row| row.get::<_, u32>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        levels
            .into_iter()
            .map(|level| self.record(ticket_id, level))
            .collect()
    }
}

impl ConfidenceSource for FeedbackStore {
    /// Wilson lower bound of the stored success rate
    fn confidence(&self, ticket_id: &str, level: u32) -> Result<f64, AssistError> {
        let record = self.record(ticket_id, level)?;
        Ok(wilson_lower_bound(
            record.success_count,
            record.attempt_count,
            self.z,
        ))
    }
}

/// Accepts both our own format and RFC 3339
fn parse_last_updated(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
