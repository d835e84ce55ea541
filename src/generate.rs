//! Troubleshooting response generation
//!
//! The generator only phrases what ranking already decided. Any failure
//! becomes a short message for the operator; it never reaches ranking.

use std::time::Duration;

use tracing::warn;

use crate::config::OllamaConfig;
use crate::error::AssistError;
use crate::ollama::OllamaClient;
use crate::ranking::RankedSolution;
use crate::storage::Ticket;

/// Turns a matched ticket plus its ranked solutions into prose
pub trait ResponseGenerator {
    fn generate(&self, ticket: &Ticket, ranked: &[RankedSolution]) -> Result<String, AssistError>;
}

/// Generate, degrading any failure to a user-visible message
pub fn generate_or_degrade(
    generator: &dyn ResponseGenerator,
    ticket: &Ticket,
    ranked: &[RankedSolution],
) -> String {
    match generator.generate(ticket, ranked) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!(ticket_id = %ticket.id, "generator returned empty text");
            AssistError::upstream("generation", "empty response").user_message()
        }
        Err(e) => {
            warn!(ticket_id = %ticket.id, error = %e, "response generation failed");
            e.user_message()
        }
    }
}

/// Prompt that pins the model to the known solutions, in ranked order
pub fn build_prompt(ticket: &Ticket, ranked: &[RankedSolution]) -> String {
    let solutions_text = ranked
        .iter()
        .map(|s| format!("Solution {}: {}", s.level, s.text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a technical support assistant.\n\
         Only use the information provided below.\n\
         Do not invent new steps.\n\
         \n\
         Ticket ID: {}\n\
         System: {}\n\
         \n\
         Known solutions:\n\
         {}\n\
         \n\
         Generate a concise, structured troubleshooting response.",
        ticket.id, ticket.system, solutions_text
    )
}

/// Responses from Ollama's `/api/generate`
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: &str, timeout: Duration) -> Self {
        Self {
            client,
            model: model.to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &OllamaConfig) -> Result<Self, AssistError> {
        Ok(Self::new(
            OllamaClient::new(&config.base_url)?,
            &config.generate_model,
            Duration::from_secs(config.generate_timeout_secs),
        ))
    }
}

impl ResponseGenerator for OllamaGenerator {
    fn generate(&self, ticket: &Ticket, ranked: &[RankedSolution]) -> Result<String, AssistError> {
        let prompt = build_prompt(ticket, ranked);
        self.client.generate(&self.model, &prompt, self.timeout)
    }
}
