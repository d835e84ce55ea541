//! Ticket retrieval - similarity floor, recency blend, deterministic order
//!
//! The nearest-neighbour lookup itself lives behind `storage::TicketIndex`;
//! this module only decides which candidates survive and in what order.

mod search;

pub use search::{find_best_match, Candidate, RetrievalResult, SimilaritySearch};
