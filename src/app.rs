//! Application context - the one object handlers talk to
//!
//! Built once at startup and passed by reference. Holds the collaborators
//! (embedder, ticket index, generator), the feedback store and the scoring
//! policy. No global state.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::error::AssistError;
use crate::feedback::FeedbackStore;
use crate::generate::{generate_or_degrade, OllamaGenerator, ResponseGenerator};
use crate::paths;
use crate::ranking::{RankedSolution, SolutionRanker};
use crate::recency::{Clock, SystemClock};
use crate::retrieval::{Candidate, RetrievalResult, SimilaritySearch};
use crate::storage::{Ticket, TicketIndex, TicketStorage};

/// Best ticket for a query plus its ranked solutions
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub result: RetrievalResult,
    pub solutions: Vec<RankedSolution>,
}

impl Match {
    pub fn ticket(&self) -> &Ticket {
        &self.result.ticket
    }
}

pub struct AppContext {
    embedder: Box<dyn Embedder>,
    index: Box<dyn TicketIndex>,
    generator: Box<dyn ResponseGenerator>,
    feedback: FeedbackStore,
    clock: Arc<dyn Clock>,
    search: SimilaritySearch,
    ranker: SolutionRanker,
    top_k: usize,
}

impl AppContext {
    /// Wire explicit collaborators (tests, alternative backends)
    pub fn new(
        config: &Config,
        embedder: Box<dyn Embedder>,
        index: Box<dyn TicketIndex>,
        generator: Box<dyn ResponseGenerator>,
        feedback: FeedbackStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            feedback,
            clock,
            search: SimilaritySearch::from_config(&config.scoring),
            ranker: SolutionRanker::from_config(&config.scoring),
            top_k: config.retrieval.top_k,
        }
    }

    /// Production wiring: Ollama collaborators, on-disk index and store
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;

        let data_dir = paths::data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let feedback =
            FeedbackStore::open_with(paths::feedback_db(), clock.clone(), config.scoring.wilson_z)
                .context("Failed to open feedback store")?;

        let storage =
            TicketStorage::open(paths::tickets_dir()).context("Failed to open ticket storage")?;
        if !storage.is_indexed() {
            anyhow::bail!(
                "No ticket index found at {}\n\nRun `support-assist ingest <FILE>` first.",
                paths::tickets_dir().display()
            );
        }

        Ok(Self::new(
            config,
            Box::new(OllamaEmbedder::from_config(&config.ollama)?),
            Box::new(storage),
            Box::new(OllamaGenerator::from_config(&config.ollama)?),
            feedback,
            clock,
        ))
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Find the best matching ticket and rank its solutions
    ///
    /// `Ok(None)` means nothing cleared the similarity floor.
    pub fn search_and_rank(&self, query: &str) -> Result<Option<Match>, AssistError> {
        let query_embedding = self.embedder.embed(query)?;

        let hits = self
            .index
            .search(&query_embedding, self.top_k)
            .map_err(|e| AssistError::upstream("ticket index", format!("{:#}", e)))?;
        let candidates = hits
            .into_iter()
            .map(|(ticket, similarity)| Candidate {
                ticket,
                similarity: similarity as f64,
            })
            .collect();

        let now = self.clock.now();
        let Some(best) = self
            .search
            .find_best_match(candidates, self.top_k, now)
            .into_iter()
            .next()
        else {
            info!("no ticket above similarity floor");
            return Ok(None);
        };

        let solutions = self.rank(&best.ticket)?;
        debug!(
            ticket_id = %best.ticket.id,
            blended = best.blended_score,
            solutions = solutions.len(),
            "matched ticket"
        );

        Ok(Some(Match {
            result: best,
            solutions,
        }))
    }

    /// Rank a known ticket's solutions against current feedback
    pub fn rank(&self, ticket: &Ticket) -> Result<Vec<RankedSolution>, AssistError> {
        self.ranker.rank(ticket, &self.feedback, self.clock.now())
    }

    /// Prose troubleshooting response; failures become a message
    pub fn generate_response(&self, m: &Match) -> String {
        generate_or_degrade(self.generator.as_ref(), m.ticket(), &m.solutions)
    }

    /// Record one operator verdict
    pub fn submit_feedback(
        &self,
        ticket_id: &str,
        level: u32,
        succeeded: bool,
    ) -> Result<(), AssistError> {
        self.feedback.record_outcome(ticket_id, level, succeeded)
    }

    /// "None of the solutions worked": one failure per ranked level
    ///
    /// Returns the levels recorded. Stops at the first storage failure;
    /// levels before it stay recorded.
    pub fn mark_none_worked(
        &self,
        ticket_id: &str,
        ranked: &[RankedSolution],
    ) -> Result<Vec<u32>, AssistError> {
        let mut recorded = Vec::with_capacity(ranked.len());
        for solution in ranked {
            self.feedback
                .record_outcome(ticket_id, solution.level, false)?;
            recorded.push(solution.level);
        }
        info!(ticket_id, levels = ?recorded, "no solution worked");
        Ok(recorded)
    }

    /// Look up an indexed ticket by id
    pub fn ticket(&self, ticket_id: &str) -> Result<Option<Ticket>, AssistError> {
        self.index
            .ticket(ticket_id)
            .map_err(|e| AssistError::upstream("ticket index", format!("{:#}", e)))
    }
}
