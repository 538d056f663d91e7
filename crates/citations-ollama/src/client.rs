//! Ollama HTTP client.

use crate::error::{OllamaError, OllamaResult};
use crate::types::*;
use citations_config::OllamaConfig;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Client for Ollama's model listing and embedding endpoints.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration.
    pub fn from_config(config: &OllamaConfig) -> OllamaResult<Self> {
        Self::with_timeout(&config.host, Duration::from_secs(config.timeout_seconds))
    }

    /// Create a new client with default settings.
    pub fn new(host: impl Into<String>) -> OllamaResult<Self> {
        Self::with_timeout(&host.into(), Duration::from_secs(120))
    }

    fn with_timeout(host: &str, timeout: Duration) -> OllamaResult<Self> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() || !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(OllamaError::InvalidHost(host.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(OllamaError::Http)?;

        Ok(Self {
            client,
            host: host.to_string(),
            timeout,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Check if Ollama server is available.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// List all available models.
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Listing models from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(OllamaError::ApiError {
                status,
                message: text,
            });
        }

        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Check if a specific model is available.
    pub async fn has_model(&self, model: &str) -> OllamaResult<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.matches(model)))
    }

    /// Generate embeddings for text.
    pub async fn embed(&self, model: &str, text: &str) -> OllamaResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.host);
        debug!("Generating embedding with model {} for text length {}", model, text.len());

        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let response = Self::check_status(response, model).await?;
        let embedding_response: EmbeddingResponse = response.json().await?;
        debug!("Generated embedding with {} dimensions", embedding_response.embedding.len());

        non_empty(model, embedding_response.embedding)
    }

    /// Generate embeddings for multiple texts, one request each.
    ///
    /// Fails if the vectors do not all have the same length.
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> OllamaResult<Vec<Vec<f32>>> {
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

        for text in texts {
            let embedding = self.embed(model, text).await?;
            if let Some(first) = embeddings.first() {
                if first.len() != embedding.len() {
                    return Err(OllamaError::DimensionMismatch {
                        expected: first.len(),
                        actual: embedding.len(),
                    });
                }
            }
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }

    fn send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ServerNotRunning {
                host: self.host.clone(),
            }
        } else if e.is_timeout() {
            OllamaError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            OllamaError::Http(e)
        }
    }

    async fn check_status(response: Response, model: &str) -> OllamaResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if text.contains("not found") || status.as_u16() == 404 {
            return Err(OllamaError::ModelNotFound {
                model: model.to_string(),
            });
        }

        Err(OllamaError::ApiError {
            status: status.as_u16(),
            message: text,
        })
    }
}

fn non_empty(model: &str, embedding: Vec<f32>) -> OllamaResult<Vec<f32>> {
    if embedding.is_empty() {
        return Err(OllamaError::EmptyEmbedding {
            model: model.to_string(),
        });
    }
    Ok(embedding)
}
