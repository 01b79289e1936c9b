//! Core data types and error definitions for the processing pipeline.

use crate::embedding::EmbeddingError;
use crate::extract::ExtractionError;
use thiserror::Error;

/// Errors produced while turning extracted text into bounded chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// The configured character budget is impossible.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The configured overlap would prevent forward progress.
    #[error("overlap ({overlap}) must be smaller than the chunk size ({max_chunk_size})")]
    InvalidOverlap {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        max_chunk_size: usize,
    },
}

/// Errors emitted by the upload-to-embeddings pipeline.
///
/// Exactly one of these is surfaced per failed request; the pipeline never
/// returns partial results.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The detector found no matching format category.
    #[error("unsupported file format for '{filename}'")]
    UnsupportedFormat {
        /// Declared name of the rejected upload.
        filename: String,
    },
    /// Category-specific parse, decode, or OCR failure.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// Extraction succeeded but produced zero chunkable text.
    #[error("the document contained no chunkable text")]
    EmptyContent,
    /// Chunking parameters were invalid; prevented at startup by config validation.
    #[error("invalid chunking parameters")]
    Chunking(#[from] ChunkingError),
    /// The embedding model failed to produce vectors.
    #[error("failed to generate embeddings")]
    Embedding(#[from] EmbeddingError),
}

impl PipelineError {
    /// Stable wire category identifying the failure class.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Extraction(_) => "extraction_error",
            Self::EmptyContent => "empty_content",
            Self::Chunking(_) => "invalid_configuration",
            Self::Embedding(_) => "embedding_error",
        }
    }

    /// Pipeline stage that reported the failure.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "detect",
            Self::Extraction(_) | Self::EmptyContent => "extract",
            Self::Chunking(_) => "chunk",
            Self::Embedding(_) => "embed",
        }
    }
}

/// One uploaded file, held fully in memory for the duration of a request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename declared by the uploader.
    pub filename: String,
    /// MIME type declared by the transport, if any.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Position of the chunk within the document.
    pub index: usize,
    /// Chunk text.
    pub text: String,
    /// Fixed-dimensionality embedding for the chunk.
    pub embedding: Vec<f32>,
}

/// Complete pipeline output for one upload; returned once, never persisted.
#[derive(Debug, Clone)]
pub struct DocumentVectors {
    /// Original filename of the upload.
    pub filename: String,
    /// SHA-256 of the uploaded bytes, hex encoded.
    pub file_hash: String,
    /// Chunk size in effect for this document.
    pub chunk_size: usize,
    /// Chunks in document order, each with its embedding.
    pub chunks: Vec<EmbeddedChunk>,
}
