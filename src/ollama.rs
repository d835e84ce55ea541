use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::AssistError;

/// Blocking client for a local Ollama server
///
/// One request per call, bounded by a timeout, never retried here.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

/// Request for `/api/embeddings`
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Request for `/api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaClient {
    /// Create a new client for `base_url` (e.g. `http://localhost:11434`)
    pub fn new(base_url: &str) -> Result<Self, AssistError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| AssistError::upstream("ollama", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Embed one text
    pub fn embed(
        &self,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Vec<f32>, AssistError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body: EmbeddingResponse = self.post_json(
            "embedding",
            &url,
            &EmbeddingRequest { model, prompt },
            timeout,
        )?;

        match body.embedding {
            Some(vec) if !vec.is_empty() => Ok(vec),
            _ => Err(AssistError::upstream(
                "embedding",
                format!("response from model '{}' has no embedding", model),
            )),
        }
    }

    /// Generate a completion (non-streaming)
    pub fn generate(
        &self,
        model: &str,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, AssistError> {
        let url = format!("{}/api/generate", self.base_url);
        let body: GenerateResponse = self.post_json(
            "generation",
            &url,
            &GenerateRequest {
                model,
                prompt,
                stream: false,
            },
            timeout,
        )?;

        body.response.ok_or_else(|| {
            AssistError::upstream(
                "generation",
                format!("response from model '{}' has no text", model),
            )
        })
    }

    fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp, AssistError> {
        debug!(url, "ollama request");
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(request)
            .send()
            .map_err(|e| {
                warn!(url, error = %e, "ollama unreachable");
                AssistError::upstream(service, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(AssistError::upstream(
                service,
                format!("HTTP {}: {}", status, detail.trim()),
            ));
        }

        response
            .json::<Resp>()
            .map_err(|e| AssistError::upstream(service, format!("malformed response: {}", e)))
    }
}
