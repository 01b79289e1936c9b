//! ONNX-backed sentence embedder.
//!
//! Loads a sentence-transformers model (default `all-MiniLM-L6-v2`, 384
//! dimensions) exactly once at process start and keeps it read-only for the
//! process lifetime. Inference applies mean pooling over the attention mask
//! followed by L2 normalization, so a chunk embeds to the same vector no
//! matter how requests are batched. The ONNX session itself is not reentrant
//! and is serialized behind a mutex; the weights are never mutated.

use super::{EmbeddingClient, EmbeddingError};
use async_trait::async_trait;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokenizers::Tokenizer;

/// Token budget per sequence; longer inputs are truncated by the tokenizer.
const MAX_SEQUENCE_LENGTH: usize = 256;
/// Number of texts embedded per inference call.
const BATCH_SIZE: usize = 32;

/// Sentence embedder backed by an ONNX Runtime session.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
}

impl OnnxEmbedder {
    /// Load the model and tokenizer, downloading them into `cache_dir` on
    /// first use. Any failure here is fatal: the service must not start
    /// without a working embedder.
    pub async fn load(
        model: &str,
        dimension: usize,
        cache_dir: &Path,
    ) -> Result<Self, EmbeddingError> {
        tracing::info!(model, dimension, "Initializing ONNX embedder");

        std::fs::create_dir_all(cache_dir).map_err(|err| {
            EmbeddingError::ModelLoad(format!("failed to create model cache directory: {err}"))
        })?;

        let model_path = cache_dir.join("model.onnx");
        let tokenizer_path = cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            download_artifact(model, "onnx/model.onnx", &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download_artifact(model, "tokenizer.json", &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|err| EmbeddingError::ModelLoad(err.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|err| EmbeddingError::ModelLoad(err.to_string()))?
            .with_intra_threads(4)
            .map_err(|err| EmbeddingError::ModelLoad(err.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|err| EmbeddingError::ModelLoad(err.to_string()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|err| EmbeddingError::ModelLoad(err.to_string()))?;

        tracing::info!("ONNX embedder ready");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimension,
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|err| EmbeddingError::GenerationFailed(format!("tokenization: {err}")))?;

        let max_len = encodings
            .iter()
            .map(|encoding| encoding.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_SEQUENCE_LENGTH)
            .max(1);

        let mut input_ids = vec![0_i64; batch_size * max_len];
        let mut attention_mask = vec![0_i64; batch_size * max_len];
        let mut token_type_ids = vec![0_i64; batch_size * max_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();
            let len = ids.len().min(max_len);
            for col in 0..len {
                input_ids[row * max_len + col] = i64::from(ids[col]);
                attention_mask[row * max_len + col] = i64::from(mask[col]);
                token_type_ids[row * max_len + col] = i64::from(types[col]);
            }
        }

        let shape = vec![batch_size, max_len];
        let input_ids_tensor = Tensor::from_array((shape.clone(), input_ids.into_boxed_slice()))
            .map_err(|err| EmbeddingError::GenerationFailed(err.to_string()))?;
        let attention_tensor = Tensor::from_array((
            shape.clone(),
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(|err| EmbeddingError::GenerationFailed(err.to_string()))?;
        let token_type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))
            .map_err(|err| EmbeddingError::GenerationFailed(err.to_string()))?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_tensor.into_dyn()),
            ("token_type_ids", token_type_tensor.into_dyn()),
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::GenerationFailed("model session poisoned".into()))?;
        let outputs = session
            .run(inputs)
            .map_err(|err| EmbeddingError::GenerationFailed(err.to_string()))?;

        let collected: Vec<_> = outputs.iter().collect();
        let output = collected
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| collected.first())
            .map(|(_, value)| value)
            .ok_or_else(|| {
                EmbeddingError::GenerationFailed("model produced no output tensor".into())
            })?;

        let (tensor_shape, tensor_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|err| EmbeddingError::GenerationFailed(err.to_string()))?;
        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();
        let hidden_size = dims.get(2).copied().unwrap_or(self.dimension);

        if hidden_size != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: hidden_size,
            });
        }

        Ok(mean_pool(
            tensor_data,
            &attention_mask,
            batch_size,
            max_len,
            hidden_size,
        ))
    }
}

/// Mean pooling over unmasked token states, followed by L2 normalization.
fn mean_pool(
    hidden_states: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    max_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for row in 0..batch_size {
        let mut pooled = vec![0.0_f32; hidden_size];
        let mut token_count = 0.0_f32;

        for col in 0..max_len {
            if attention_mask[row * max_len + col] == 0 {
                continue;
            }
            let base = row * max_len * hidden_size + col * hidden_size;
            for (slot, value) in pooled.iter_mut().zip(&hidden_states[base..base + hidden_size]) {
                *slot += value;
            }
            token_count += 1.0;
        }

        if token_count > 0.0 {
            for value in &mut pooled {
                *value /= token_count;
            }
        }

        let norm = pooled.iter().map(|value| value * value).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut pooled {
                *value /= norm;
            }
        }

        embeddings.push(pooled);
    }

    embeddings
}

#[async_trait]
impl EmbeddingClient for OnnxEmbedder {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let borrowed: Vec<&str> = texts.iter().map(String::as_str).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in borrowed.chunks(BATCH_SIZE) {
            embeddings.extend(self.embed_batch(batch)?);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Fetch one model artifact from the sentence-transformers hub into the cache.
async fn download_artifact(
    model: &str,
    remote_file: &str,
    target: &PathBuf,
) -> Result<(), EmbeddingError> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{model}/resolve/main/{remote_file}"
    );
    tracing::info!(%url, "Downloading model artifact");

    let response = reqwest::get(&url)
        .await
        .map_err(|err| EmbeddingError::ModelLoad(format!("download failed: {err}")))?;
    if !response.status().is_success() {
        return Err(EmbeddingError::ModelLoad(format!(
            "download failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| EmbeddingError::ModelLoad(format!("download failed: {err}")))?;
    std::fs::write(target, &bytes)
        .map_err(|err| EmbeddingError::ModelLoad(format!("failed to write artifact: {err}")))?;

    tracing::info!(bytes = bytes.len(), path = %target.display(), "Artifact cached");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::mean_pool;

    #[test]
    fn mean_pool_averages_unmasked_tokens_and_normalizes() {
        // One sequence of two tokens, hidden size two; second token masked out.
        let hidden_states = [3.0, 4.0, 100.0, 100.0];
        let attention_mask = [1_i64, 0];
        let embeddings = mean_pool(&hidden_states, &attention_mask, 1, 2, 2);
        assert_eq!(embeddings.len(), 1);
        // Only the first token contributes: (3, 4) normalized to (0.6, 0.8).
        assert!((embeddings[0][0] - 0.6).abs() < 1e-6);
        assert!((embeddings[0][1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn mean_pool_handles_fully_masked_rows() {
        let hidden_states = [1.0, 2.0];
        let attention_mask = [0_i64];
        let embeddings = mean_pool(&hidden_states, &attention_mask, 1, 1, 2);
        assert_eq!(embeddings[0], vec![0.0, 0.0]);
    }
}
