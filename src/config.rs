//! Configuration for support-assist
//!
//! Loaded from `.support-assist/config.toml` in the working directory if
//! present, else from `~/.support-assist/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine.
//!
//! ```toml
//! [scoring]
//! half_life_days = 180.0
//! similarity_floor = 0.5
//!
//! [ollama]
//! base_url = "http://localhost:11434"
//! embed_model = "nomic-embed-text"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AssistError;
use crate::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub retrieval: RetrievalConfig,
    pub ollama: OllamaConfig,
}

/// Weights and constants of the ranking math
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Recency decay constant in days
    pub half_life_days: f64,
    /// Candidates below this raw similarity are dropped (inclusive floor)
    pub similarity_floor: f64,
    /// Weight of similarity in the ticket blend; recency gets the rest
    pub similarity_weight: f64,
    /// Weight of feedback confidence in the solution score
    pub feedback_weight: f64,
    /// Penalty per escalation level above 1
    pub escalation_step: f64,
    /// Wilson interval z (1.96 = 95%)
    pub wilson_z: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            half_life_days: 180.0,
            similarity_floor: 0.5,
            similarity_weight: 0.7,
            feedback_weight: 0.7,
            escalation_step: 0.1,
            wilson_z: 1.96,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbours fetched per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Local Ollama server used for embeddings and response generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embed_model: String,
    pub generate_model: String,
    pub embed_timeout_secs: u64,
    pub generate_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.1:8b".to_string(),
            embed_timeout_secs: 60,
            generate_timeout_secs: 90,
        }
    }
}

impl Config {
    /// Load configuration, project file first, then user file, then defaults
    pub fn load() -> Result<Self> {
        for path in [paths::project_config_path(), paths::config_path()] {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make scores meaningless
    pub fn validate(&self) -> Result<(), AssistError> {
        let s = &self.scoring;
        if !(s.half_life_days > 0.0) {
            return Err(AssistError::Config("half_life_days must be > 0".into()));
        }
        for (name, w) in [
            ("similarity_weight", s.similarity_weight),
            ("feedback_weight", s.feedback_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(AssistError::Config(format!("{} must be within [0, 1]", name)));
            }
        }
        if !(-1.0..=1.0).contains(&s.similarity_floor) {
            return Err(AssistError::Config(
                "similarity_floor must be within [-1, 1]".into(),
            ));
        }
        if !(s.escalation_step >= 0.0) || !(s.wilson_z > 0.0) {
            return Err(AssistError::Config(
                "escalation_step must be >= 0 and wilson_z > 0".into(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(AssistError::Config("top_k must be at least 1".into()));
        }
        Ok(())
    }
}
