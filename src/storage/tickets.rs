//! Ticket storage using SQLite + USearch hybrid approach
//!
//! SQLite stores the source of truth (ticket rows as JSON).
//! USearch provides nearest-neighbour search over problem-text embeddings.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::embeddings::normalize;
use crate::storage::types::Ticket;

/// Nearest-neighbour lookup over indexed tickets
///
/// Similarity is comparable across calls and roughly bounded in [-1, 1].
pub trait TicketIndex {
    fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<(Ticket, f32)>>;

    /// Fetch one indexed ticket by its dataset id
    fn ticket(&self, ticket_id: &str) -> Result<Option<Ticket>>;
}

/// Dual storage for tickets: SQLite + USearch
pub struct TicketStorage {
    vectors: Option<Index>,
    db: Connection,
    index_path: PathBuf,
}

impl TicketStorage {
    /// Open or create ticket storage at the given directory
    ///
    /// Creates two files:
    /// - `{path}/tickets.db` - SQLite database
    /// - `{path}/tickets.usearch` - USearch vector index
    ///
    /// The vector index is only loaded if a previous build recorded its
    /// dimensions; otherwise the storage is empty until `rebuild`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base = path.as_ref();
        std::fs::create_dir_all(base)?;

        let db_path = base.join("tickets.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        Self::init_schema(&db)?;

        let index_path = base.join("tickets.usearch");
        let dimensions: Option<usize> = db
            .query_row(
                "SELECT value FROM index_meta WHERE key = 'dimensions'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|v| v.parse().ok());

        let vectors = match dimensions {
            Some(dims) if index_path.exists() => {
                let index = new_index(dims)?;
                index
                    .load(&index_path.to_string_lossy())
                    .context("Failed to load existing USearch index")?;
                info!(tickets = index.size(), dims, "loaded ticket index");
                Some(index)
            }
            _ => None,
        };

        Ok(Self {
            vectors,
            db,
            index_path,
        })
    }

    /// Initialize SQLite schema
    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS tickets (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                body TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(())
    }

    /// Whether a vector index has been built
    pub fn is_indexed(&self) -> bool {
        self.vectors.as_ref().is_some_and(|v| v.size() > 0)
    }

    /// Replace every stored ticket and rebuild the vector index
    ///
    /// `embeddings[i]` is the problem-text embedding of `tickets[i]`.
    /// Vectors are L2-normalized before insertion. On error the previous
    /// rows and index stay in place.
    pub fn rebuild(&mut self, tickets: &[Ticket], embeddings: &[Vec<f32>]) -> Result<()> {
        if tickets.len() != embeddings.len() {
            bail!(
                "Got {} embeddings for {} tickets",
                embeddings.len(),
                tickets.len()
            );
        }
        let Some(dims) = embeddings.first().map(|e| e.len()) else {
            bail!("No tickets to index");
        };
        if dims == 0 || embeddings.iter().any(|e| e.len() != dims) {
            bail!("Embeddings must share one non-zero dimension");
        }

        let index = new_index(dims)?;
        index.reserve(tickets.len())?;

        let tx = self.db.transaction()?;
        tx.execute("DELETE FROM tickets", [])?;
        for (ticket, embedding) in tickets.iter().zip(embeddings) {
            let body = serde_json::to_string(ticket)?;
            let rowid: i64 = tx
                .query_row(
                    "INSERT INTO tickets (id, body) VALUES (?1, ?2) RETURNING rowid",
                    params![&ticket.id, body],
                    |row| row.get(0),
                )
                .with_context(|| format!("Failed to store ticket {}", ticket.id))?;

            index
                .add(rowid as u64, &normalize(embedding))
                .context("Failed to add vector to USearch index")?;
        }
        tx.execute(
            "INSERT INTO index_meta (key, value) VALUES ('dimensions', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![dims.to_string()],
        )?;

        // Rows and vectors must switch together: write the index aside first,
        // so a failed save rolls the rows back with it.
        let staged = self.index_path.with_extension("usearch.tmp");
        index
            .save(&staged.to_string_lossy())
            .context("Failed to save USearch index")?;
        if let Err(e) = tx.commit() {
            let _ = std::fs::remove_file(&staged);
            return Err(e.into());
        }
        std::fs::rename(&staged, &self.index_path)
            .context("Failed to move USearch index into place")?;
        info!(tickets = tickets.len(), dims, "rebuilt ticket index");

        self.vectors = Some(index);
        Ok(())
    }

    /// Search and return tickets with inner-product similarity
    pub fn search_with_scores(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<(Ticket, f32)>> {
        let Some(vectors) = self.vectors.as_ref() else {
            bail!("Ticket index has not been built yet");
        };
        if vectors.size() == 0 || limit == 0 {
            return Ok(Vec::new());
        }

        let query = normalize(query_embedding);
        let matches = vectors
            .search(&query, limit)
            .context("Failed to search USearch index")?;

        // Hydrate from SQLite and pair with similarities
        let mut results = Vec::new();
        for (rowid, distance) in matches.keys.iter().zip(matches.distances.iter()) {
            if let Some(ticket) = self.load_by_rowid(*rowid as i64)? {
                // Inner-product distance is 1 - dot
                results.push((ticket, 1.0 - distance));
            }
        }
        debug!(hits = results.len(), limit, "ticket index search");

        Ok(results)
    }

    /// Load a ticket by its dataset id
    pub fn get(&self, ticket_id: &str) -> Result<Option<Ticket>> {
        let body: Option<String> = self
            .db
            .query_row(
                "SELECT body FROM tickets WHERE id = ?1",
                params![ticket_id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).context("Corrupt ticket row"))
            .transpose()
    }

    /// Load a ticket by rowid from SQLite
    fn load_by_rowid(&self, rowid: i64) -> Result<Option<Ticket>> {
        let body: Option<String> = self
            .db
            .query_row(
                "SELECT body FROM tickets WHERE rowid = ?1",
                params![rowid],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|b| serde_json::from_str(&b).context("Corrupt ticket row"))
            .transpose()
    }

    /// Get count of tickets in storage
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl TicketIndex for TicketStorage {
    fn search(&self, query_embedding: &[f32], k: usize) -> Result<Vec<(Ticket, f32)>> {
        self.search_with_scores(query_embedding, k)
    }

    fn ticket(&self, ticket_id: &str) -> Result<Option<Ticket>> {
        self.get(ticket_id)
    }
}

fn new_index(dimensions: usize) -> Result<Index> {
    let options = IndexOptions {
        dimensions,
        metric: MetricKind::IP, // Vectors are normalized, so IP == cosine
        quantization: ScalarKind::F32,
        ..Default::default()
    };

    Index::new(&options).context("Failed to create USearch index")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::Solution;
    use tempfile::TempDir;

    fn ticket(id: &str, problem: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            system: "Printer".to_string(),
            problem_text: problem.to_string(),
            solutions: vec![Solution {
                level: 1,
                text: "Power cycle".to_string(),
                proposed_at: None,
            }],
            resolved_at: None,
        }
    }

    fn axis(dims: usize, i: usize) -> Vec<f32> {
        let mut v = vec![0.0; dims];
        v[i] = 1.0;
        v
    }

    #[test]
    fn test_ticket_storage_creation() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = TicketStorage::open(temp.path())?;
        assert_eq!(storage.count()?, 0);
        assert!(!storage.is_indexed());
        Ok(())
    }

    #[test]
    fn test_search_before_build_fails() -> Result<()> {
        let temp = TempDir::new()?;
        let storage = TicketStorage::open(temp.path())?;
        assert!(storage.search_with_scores(&axis(8, 0), 3).is_err());
        Ok(())
    }

    #[test]
    fn test_rebuild_and_search_ranking() -> Result<()> {
        let temp = TempDir::new()?;
        let mut storage = TicketStorage::open(temp.path())?;

        let tickets = vec![ticket("A", "paper jam"), ticket("B", "toner empty")];
        storage.rebuild(&tickets, &[axis(16, 0), axis(16, 1)])?;
        assert_eq!(storage.count()?, 2);

        // Closer to A than to B, deliberately not unit length
        let mut query = vec![0.0; 16];
        query[0] = 1.8;
        query[1] = 0.2;

        let results = storage.search_with_scores(&query, 2)?;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "A");
        assert!(results[0].1 > results[1].1);
        assert!(results[0].1 <= 1.0 + 1e-5);

        Ok(())
    }

    #[test]
    fn test_index_survives_reopen() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut storage = TicketStorage::open(temp.path())?;
            storage.rebuild(&[ticket("A", "paper jam")], &[axis(8, 3)])?;
        }

        let storage = TicketStorage::open(temp.path())?;
        assert!(storage.is_indexed());
        let results = storage.search_with_scores(&axis(8, 3), 1)?;
        assert_eq!(results[0].0.id, "A");
        assert_eq!(storage.get("A")?.map(|t| t.problem_text), Some("paper jam".into()));
        assert!(storage.get("missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_rebuild_rejects_mismatched_input() -> Result<()> {
        let temp = TempDir::new()?;
        let mut storage = TicketStorage::open(temp.path())?;
        assert!(storage.rebuild(&[ticket("A", "x")], &[]).is_err());
        assert!(storage
            .rebuild(
                &[ticket("A", "x"), ticket("B", "y")],
                &[axis(4, 0), axis(5, 0)]
            )
            .is_err());
        Ok(())
    }
    #[test]
    fn test_failed_index_save_keeps_previous_tickets() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut storage = TicketStorage::open(temp.path())?;
            storage.rebuild(&[ticket("A", "paper jam")], &[axis(8, 3)])?;

            // Nothing can be written where the staged index should go
            std::fs::create_dir(temp.path().join("tickets.usearch.tmp"))?;
            assert!(storage
                .rebuild(&[ticket("B", "toner empty")], &[axis(8, 5)])
                .is_err());
        }

        let storage = TicketStorage::open(temp.path())?;
        assert_eq!(storage.count()?, 1);
        let results = storage.search_with_scores(&axis(8, 3), 1)?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, "A");
        assert!(storage.get("B")?.is_none());
        Ok(())
    }
}
