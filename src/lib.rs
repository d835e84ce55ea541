pub mod app;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod feedback;
pub mod generate;
pub mod ingest;
pub mod ollama;
pub mod paths;
pub mod ranking;
pub mod recency;
pub mod retrieval;
pub mod storage;

// Re-export commonly used types
pub use app::{AppContext, Match};
pub use config::Config;
pub use error::AssistError;
pub use feedback::{FeedbackRecord, FeedbackStore};
pub use ranking::{RankedSolution, SolutionRanker};
pub use recency::{Clock, FixedClock, RecencyModel, SystemClock};
pub use retrieval::{Candidate, RetrievalResult, SimilaritySearch};
pub use storage::{Solution, Ticket, TicketStorage};
