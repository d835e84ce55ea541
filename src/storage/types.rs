//! Domain types for storage layer
//!
//! These types are storage-agnostic - they don't know about SQLite or USearch.
//! Storage wrappers handle serialization/deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved support ticket from the historical dataset
///
/// Read-only once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub system: String,
    pub problem_text: String,
    pub solutions: Vec<Solution>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One remedy attached to a ticket
///
/// `level` is the escalation step: 1 is the first, cheapest thing to try.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub level: u32,
    pub text: String,
    pub proposed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Solution levels present on this ticket, in stored order
    pub fn levels(&self) -> Vec<u32> {
        self.solutions.iter().map(|s| s.level).collect()
    }
}
