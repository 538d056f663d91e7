//! Errors from the embedding server.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OllamaError {
    /// `ollama.host` in the config is unusable.
    #[error("Invalid Ollama host '{0}': set ollama.host to a URL such as http://localhost:11434")]
    InvalidHost(String),

    #[error("Ollama server is not running at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Model not found: {model}. Run 'ollama pull {model}' to download it.")]
    ModelNotFound { model: String },

    /// The server answered with a non-success status.
    #[error("Ollama returned status {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The server answered but the vector was empty, usually a model that
    /// does not produce embeddings.
    #[error("Model {model} returned an empty embedding; is it an embedding model?")]
    EmptyEmbedding { model: String },

    /// Vectors for chunks of one batch must share a dimension to be comparable.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type OllamaResult<T> = Result<T, OllamaError>;
