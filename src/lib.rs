#![deny(missing_docs)]

//! Core library for the Docvec embedding pipeline server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// File format detection.
pub mod detect;
/// Embedding model abstraction and the ONNX-backed implementation.
pub mod embedding;
/// Format-specific text extraction strategies.
pub mod extract;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Document processing pipeline: extraction, chunking, embedding.
pub mod processing;
