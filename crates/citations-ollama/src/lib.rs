//! Citations Ollama - Embedding generation through a local Ollama server.
//!
//! Chunks written by the scanner can be embedded here so the index supports
//! semantic search next to keyword search.

mod client;
mod error;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use types::*;
