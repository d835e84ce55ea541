//! Embeddings module - Generate semantic embeddings for text
//!
//! Provides trait-based abstraction for embedding generation. The default
//! backend is a local Ollama server; tests plug in deterministic fakes.

mod similarity;

pub use similarity::normalize;

use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::AssistError;
use crate::ollama::OllamaClient;

/// Trait for embedding generation engines
pub trait Embedder {
    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, AssistError>;

    /// Generate embeddings for multiple texts
    ///
    /// Default implementation embeds one at a time and stops at the first
    /// failure.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AssistError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Embeddings served by Ollama's `/api/embeddings`
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    timeout: Duration,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: &str, timeout: Duration) -> Self {
        Self {
            client,
            model: model.to_string(),
            timeout,
        }
    }

    /// Build from the `[ollama]` config section
    pub fn from_config(config: &OllamaConfig) -> Result<Self, AssistError> {
        Ok(Self::new(
            OllamaClient::new(&config.base_url)?,
            &config.embed_model,
            Duration::from_secs(config.embed_timeout_secs),
        ))
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, AssistError> {
        self.client.embed(&self.model, text, self.timeout)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
