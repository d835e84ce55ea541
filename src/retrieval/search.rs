//! Blended ticket scoring
//!
//! blended = w_sim * similarity + (1 - w_sim) * recency(resolved_at)
//!
//! Recency here is ticket-level (time since resolution). Solution feedback
//! is never consulted.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::recency::RecencyModel;
use crate::storage::Ticket;

/// A ticket returned by the index with its raw similarity
#[derive(Debug, Clone)]
pub struct Candidate {
    pub ticket: Ticket,
    pub similarity: f64,
}

/// A candidate that cleared the similarity floor
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub ticket: Ticket,
    pub similarity: f64,
    pub recency: f64,
    pub blended_score: f64,
}

/// Floor + blend parameters
#[derive(Debug, Clone, Copy)]
pub struct SimilaritySearch {
    /// Candidates strictly below this are dropped
    pub floor: f64,
    pub similarity_weight: f64,
    pub recency: RecencyModel,
}

impl Default for SimilaritySearch {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl SimilaritySearch {
    pub fn from_config(scoring: &ScoringConfig) -> Self {
        Self {
            floor: scoring.similarity_floor,
            similarity_weight: scoring.similarity_weight,
            recency: RecencyModel::new(scoring.half_life_days),
        }
    }

    /// Filter, score and order candidates; at most `k` results
    ///
    /// An empty result means "no match", not an error.
    pub fn find_best_match(
        &self,
        candidates: Vec<Candidate>,
        k: usize,
        now: DateTime<Utc>,
    ) -> Vec<RetrievalResult> {
        let mut results: Vec<RetrievalResult> = candidates
            .into_iter()
            .filter(|c| c.similarity.is_finite() && c.similarity >= self.floor)
            .map(|c| {
                let recency = self.recency.score(c.ticket.resolved_at, now);
                let blended_score =
                    self.similarity_weight * c.similarity + (1.0 - self.similarity_weight) * recency;
                RetrievalResult {
                    ticket: c.ticket,
                    similarity: c.similarity,
                    recency,
                    blended_score,
                }
            })
            .collect();

        results.sort_by(compare_results);
        results.truncate(k);
        results
    }
}

/// Blended desc, then similarity desc, then ticket id asc
fn compare_results(a: &RetrievalResult, b: &RetrievalResult) -> Ordering {
    b.blended_score
        .total_cmp(&a.blended_score)
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.ticket.id.cmp(&b.ticket.id))
}

/// Convenience wrapper using reference weights
pub fn find_best_match(
    candidates: Vec<Candidate>,
    k: usize,
    now: DateTime<Utc>,
) -> Vec<RetrievalResult> {
    SimilaritySearch::default().find_best_match(candidates, k, now)
}
