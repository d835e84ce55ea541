//! Solution ranking for a matched ticket
//!
//! final_score = w_feedback * confidence - step * (level - 1)
//!
//! Solution recency is computed and reported but does not enter the score.
//! Ties go to the lower (cheaper) escalation level.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::error::AssistError;
use crate::feedback::ConfidenceSource;
use crate::recency::RecencyModel;
use crate::storage::Ticket;

/// One solution with its score breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSolution {
    pub level: u32,
    pub text: String,
    pub recency: f64,
    pub confidence: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SolutionRanker {
    pub feedback_weight: f64,
    pub escalation_step: f64,
    pub recency: RecencyModel,
}

impl Default for SolutionRanker {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl SolutionRanker {
    pub fn from_config(scoring: &ScoringConfig) -> Self {
        Self {
            feedback_weight: scoring.feedback_weight,
            escalation_step: scoring.escalation_step,
            recency: RecencyModel::new(scoring.half_life_days),
        }
    }

    /// Penalty for trying a more invasive remedy; zero at level 1
    pub fn escalation_penalty(&self, level: u32) -> f64 {
        self.escalation_step * level.saturating_sub(1) as f64
    }

    /// Score and order every solution of `ticket`
    ///
    /// One confidence read per solution, nothing else touches storage.
    pub fn rank(
        &self,
        ticket: &Ticket,
        feedback: &dyn ConfidenceSource,
        now: DateTime<Utc>,
    ) -> Result<Vec<RankedSolution>, AssistError> {
        let mut ranked = Vec::with_capacity(ticket.solutions.len());

        for solution in &ticket.solutions {
            let confidence = feedback.confidence(&ticket.id, solution.level)?;
            let recency = self.recency.score(solution.proposed_at, now);
            let final_score =
                self.feedback_weight * confidence - self.escalation_penalty(solution.level);

            ranked.push(RankedSolution {
                level: solution.level,
                text: solution.text.clone(),
                recency,
                confidence,
                final_score,
            });
        }

        ranked.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.level.cmp(&b.level))
        });
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{wilson_lower_bound, DEFAULT_Z};
    use crate::storage::Solution;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    /// In-memory (successes, attempts) per level
    struct Counts(HashMap<u32, (u64, u64)>);

    impl ConfidenceSource for Counts {
        fn confidence(&self, _ticket_id: &str, level: u32) -> Result<f64, AssistError> {
            let (s, n) = self.0.get(&level).copied().unwrap_or((0, 0));
            Ok(wilson_lower_bound(s, n, DEFAULT_Z))
        }
    }

    struct Broken;

    impl ConfidenceSource for Broken {
        fn confidence(&self, _ticket_id: &str, _level: u32) -> Result<f64, AssistError> {
            Err(AssistError::StorageFailure(rusqlite::Error::InvalidQuery))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    }

    fn ticket(levels: &[u32]) -> Ticket {
        Ticket {
            id: "T-100".to_string(),
            system: "POS terminal".to_string(),
            problem_text: "Card reader not detected".to_string(),
            solutions: levels
                .iter()
                .map(|&level| Solution {
                    level,
                    text: format!("remedy {}", level),
                    proposed_at: Some(now() - Duration::days(30 * level as i64)),
                })
                .collect(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_no_feedback_orders_by_level() {
        let ranked = SolutionRanker::default()
            .rank(&ticket(&[3, 1, 2]), &Counts(HashMap::new()), now())
            .unwrap();

        let levels: Vec<u32> = ranked.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_relative_eq!(ranked[0].final_score, 0.0);
        assert_relative_eq!(ranked[1].final_score, -0.1, epsilon = 1e-12);
        assert_relative_eq!(ranked[2].final_score, -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_proven_escalation_outranks_untested_first_step() {
        let counts = Counts(HashMap::from([(2, (10, 10))]));
        let ranked = SolutionRanker::default()
            .rank(&ticket(&[1, 2]), &counts, now())
            .unwrap();

        assert_eq!(ranked[0].level, 2);
        assert_relative_eq!(ranked[0].confidence, 0.7225, epsilon = 1e-4);
        assert_relative_eq!(ranked[0].final_score, 0.7 * ranked[0].confidence - 0.1, epsilon = 1e-12);
        assert_relative_eq!(ranked[0].final_score, 0.4057, epsilon = 1e-3);
        assert_eq!(ranked[1].level, 1);
        assert_relative_eq!(ranked[1].final_score, 0.0);
    }

    #[test]
    fn test_equal_scores_prefer_lower_level() {
        let ranker = SolutionRanker {
            escalation_step: 0.0,
            ..SolutionRanker::default()
        };
        let ranked = ranker
            .rank(&ticket(&[2, 1]), &Counts(HashMap::new()), now())
            .unwrap();
        assert_eq!(ranked[0].final_score, ranked[1].final_score);
        assert_eq!(ranked[0].level, 1);
    }

    #[test]
    fn test_recency_reported_not_scored() {
        let counts = Counts(HashMap::from([(1, (3, 4))]));
        let ranked = SolutionRanker::default()
            .rank(&ticket(&[1]), &counts, now())
            .unwrap();

        let r = &ranked[0];
        assert!(r.recency > 0.0 && r.recency < 1.0);
        assert_relative_eq!(r.final_score, 0.7 * r.confidence, epsilon = 1e-12);
    }

    #[test]
    fn test_ticket_without_solutions() {
        let ranked = SolutionRanker::default()
            .rank(&ticket(&[]), &Counts(HashMap::new()), now())
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_storage_failure_propagates() {
        let err = SolutionRanker::default()
            .rank(&ticket(&[1]), &Broken, now())
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
