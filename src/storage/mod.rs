//! Ticket storage - SQLite + USearch hybrid storage
//!
//! - SQLite holds the ticket rows (source of truth)
//! - USearch holds one normalized problem-text embedding per ticket, keyed by
//!   the SQLite rowid, searched by inner product (= cosine on unit vectors)
//!
//! # Example
//!
//! ```no_run
//! use support_assist::storage::TicketStorage;
//!
//! let storage = TicketStorage::open("/tmp/support-assist/tickets")?;
//! println!("{} tickets indexed", storage.count()?);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod tickets;
pub mod types;

pub use tickets::{TicketIndex, TicketStorage};
pub use types::{Solution, Ticket};
