//! Embedding client abstraction and the ONNX-backed implementation.

mod onnx;

pub use onnx::OnnxEmbedder;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by embedding backends.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The model or tokenizer could not be loaded; fatal at startup.
    #[error("failed to initialize embedding model: {0}")]
    ModelLoad(String),
    /// Inference failed for the supplied batch.
    #[error("failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// The model produced vectors of an unexpected dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the server was configured for.
        expected: usize,
        /// Dimension the model actually produced.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
///
/// The backend is created once at process start and shared read-only across
/// requests; implementations must be safe to call concurrently and must
/// return one vector per input text, in input order, regardless of internal
/// batching.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimensionality of the vectors this client produces.
    fn dimension(&self) -> usize;
}
