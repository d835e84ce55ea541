//! Error taxonomy for collaborator and storage failures
//!
//! "No similar ticket" is not an error: search returns `Ok(None)` for it.
//! Scoring math never fails - bad timestamps degrade to "absent".

/// Failures surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// Embedding, index or generation backend unreachable or returned garbage
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: &'static str,
        message: String,
    },

    /// Feedback read/write failed; counters are left untouched
    #[error("Feedback storage failure: {0}")]
    StorageFailure(#[from] rusqlite::Error),

    /// Ticket rows could not be read or decoded
    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AssistError {
    pub fn upstream(service: &'static str, message: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            service,
            message: message.to_string(),
        }
    }

    /// Whether the operator can simply try the same action again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::StorageFailure(_)
        )
    }

    /// Short operator-facing message
    pub fn user_message(&self) -> String {
        match self {
            Self::UpstreamUnavailable { service, .. } => format!(
                "The {} service is not reachable right now. Please try again later.",
                service
            ),
            Self::StorageFailure(_) => {
                "Feedback could not be saved. Nothing was recorded - please retry.".to_string()
            }
            Self::Ingest(msg) => format!("Ticket data could not be loaded: {}", msg),
            Self::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }
}

/// Guidance shown when no ticket clears the similarity floor
pub const NO_MATCH_GUIDANCE: &str = "No similar tickets found. \
Please provide more details about the problem or escalate to support.";

/// Guidance shown after the operator reports that no solution worked
pub const ESCALATION_GUIDANCE: &str = "Thanks for the feedback. This issue may require \
escalation or a newer solution.";
