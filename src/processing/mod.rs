//! Document processing pipeline: extraction, chunking, and embedding orchestration.

pub mod chunking;
mod service;
pub mod types;

pub use chunking::{Chunk, chunk_text};
pub use service::{PipelineApi, PipelineService};
pub use types::{
    ChunkingError, DocumentVectors, EmbeddedChunk, PipelineError, UploadedFile,
};
