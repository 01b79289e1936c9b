//! Pipeline service coordinating detection, extraction, chunking, and embedding.

use crate::{
    config::get_config,
    detect::{FormatCategory, detect_format},
    embedding::EmbeddingClient,
    extract::{ExtractOptions, extract},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::chunk_text,
        types::{DocumentVectors, EmbeddedChunk, PipelineError, UploadedFile},
    },
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Coordinates the full pipeline for one upload: detect the format, extract
/// text segments, chunk them, and embed every chunk.
///
/// The service owns the long-lived embedding client and the metrics registry;
/// everything else is created and dropped within a single request. Construct
/// the service once near process start and share it through an `Arc`.
pub struct PipelineService {
    embedder: Arc<dyn EmbeddingClient>,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface and tests.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Run the whole pipeline for one uploaded file.
    async fn process_upload(
        &self,
        upload: UploadedFile,
    ) -> Result<DocumentVectors, PipelineError>;

    /// Dimensionality of the vectors the loaded model produces.
    fn embedding_dimension(&self) -> usize;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Build a new pipeline service around an already-loaded embedding client.
    ///
    /// The client is injected rather than constructed here so tests can
    /// substitute a lightweight fake.
    pub fn new(embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            embedder,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    async fn run_pipeline(
        &self,
        upload: UploadedFile,
    ) -> Result<DocumentVectors, PipelineError> {
        let config = get_config();
        let UploadedFile {
            filename,
            content_type,
            bytes,
        } = upload;

        let category = detect_format(&filename, content_type.as_deref());
        tracing::info!(
            filename = %filename,
            category = %category,
            size = bytes.len(),
            "Processing upload"
        );
        if category == FormatCategory::Unsupported {
            return Err(PipelineError::UnsupportedFormat { filename });
        }

        let file_hash = hex::encode(Sha256::digest(&bytes));

        let options = ExtractOptions {
            tabular_segmenting: config.tabular_segmenting,
            ocr_language: config.ocr_language.clone(),
        };
        let document = extract(category, &filename, &bytes, &options).inspect_err(|error| {
            tracing::warn!(
                filename = %filename,
                category = %category,
                error = ?error.source,
                "Extraction failed"
            );
        })?;
        if document.segments.is_empty() {
            return Err(PipelineError::EmptyContent);
        }

        let text = document.segments.join("\n");
        let chunks = chunk_text(&text, config.max_chunk_size, config.chunk_overlap)?;
        if chunks.is_empty() {
            return Err(PipelineError::EmptyContent);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.generate_embeddings(texts).await?;

        debug_assert_eq!(chunks.len(), embeddings.len());

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk {
                index: chunk.index,
                text: chunk.text,
                embedding,
            })
            .collect();

        self.metrics
            .record_document(embedded.len() as u64, config.max_chunk_size as u64);
        tracing::info!(
            filename = %filename,
            category = %category,
            chunks = embedded.len(),
            chunk_size = config.max_chunk_size,
            "Document processed"
        );

        Ok(DocumentVectors {
            filename,
            file_hash,
            chunk_size: config.max_chunk_size,
            chunks: embedded,
        })
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn process_upload(
        &self,
        upload: UploadedFile,
    ) -> Result<DocumentVectors, PipelineError> {
        self.run_pipeline(upload).await
    }

    fn embedding_dimension(&self) -> usize {
        self.embedder.dimension()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
