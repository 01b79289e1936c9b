use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    chunks_embedded: AtomicU64,
    // 0 means "no document processed yet"; chunk sizes are always positive.
    last_chunk_size: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document, the number of chunks produced for it, and
    /// the chunk size that was in effect.
    pub fn record_document(&self, chunk_count: u64, chunk_size: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        self.chunks_embedded.fetch_add(chunk_count, Ordering::Relaxed);
        self.last_chunk_size.store(chunk_size, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_chunk_size = match self.last_chunk_size.load(Ordering::Relaxed) {
            0 => None,
            value => Some(value),
        };
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            chunks_embedded: self.chunks_embedded.load(Ordering::Relaxed),
            last_chunk_size,
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents processed since startup.
    pub documents_processed: u64,
    /// Total chunk count embedded across all processed documents.
    pub chunks_embedded: u64,
    /// Chunk size used by the most recent document, if any.
    pub last_chunk_size: Option<u64>,
}
