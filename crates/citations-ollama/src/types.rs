//! Types for Ollama API requests and responses.

use serde::{Deserialize, Serialize};

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub modified_at: Option<String>,
}

impl ModelInfo {
    /// Whether this model answers to `model`, with or without a tag.
    pub fn matches(&self, model: &str) -> bool {
        self.name == model
            || self
                .name
                .strip_prefix(model)
                .map(|rest| rest.starts_with(':'))
                .unwrap_or(false)
    }
}

/// Response from the /api/tags endpoint (list models).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// Request body for /api/embeddings endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub prompt: String,
}

/// Response from /api/embeddings endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_matching() {
        let model = ModelInfo {
            name: "nomic-embed-text:latest".to_string(),
            size: 0,
            digest: String::new(),
            modified_at: None,
        };
        assert!(model.matches("nomic-embed-text"));
        assert!(model.matches("nomic-embed-text:latest"));
        assert!(!model.matches("nomic-embed"));
    }

    #[test]
    fn test_parse_tags_response() {
        let list: ListModelsResponse = serde_json::from_str(
            r#"{"models": [{"name": "nomic-embed-text:latest", "size": 274302450}]}"#,
        )
        .unwrap();
        assert_eq!(list.models.len(), 1);
        assert_eq!(list.models[0].size, 274302450);
    }

    #[test]
    fn test_embedding_request_shape() {
        let request = EmbeddingRequest {
            model: "nomic-embed-text".to_string(),
            prompt: "hello".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "nomic-embed-text");
        assert_eq!(json["prompt"], "hello");
    }
}
