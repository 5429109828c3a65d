//! Query encoder for candidate retrieval.
//!
//! Use [`EncoderConfig::stub`] for tests without model files.

pub mod config;

#[cfg(test)]
mod tests;

pub use config::{ENCODER_MAX_SEQ_LEN, EncoderConfig, STUB_EMBEDDING_DIM};

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertEncoder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{ModelFiles, load_tokenizer_with_truncation};

enum EncoderBackend {
    Model {
        model: BertEncoder,
        tokenizer: Tokenizer,
        device: Device,
    },
    Stub {
        dim: usize,
    },
}

/// Turns incentive query text into a unit-length embedding.
pub struct QueryEncoder {
    backend: EncoderBackend,
}

impl std::fmt::Debug for QueryEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
            EncoderBackend::Stub { dim } => format!("Stub(dim={})", dim),
        };
        f.debug_struct("QueryEncoder")
            .field("backend", &backend)
            .finish()
    }
}

impl QueryEncoder {
    pub fn load(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let Some(model_path) = config.model_path.as_deref() else {
            warn!("No encoder model configured, query embeddings are STUB (testing only)");
            return Ok(Self::stub_with_dim(config.stub_dim));
        };

        let files = ModelFiles::locate(model_path)?;
        let device = select_device()?;

        let model =
            BertEncoder::load(&files, &device).map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("failed to load encoder: {}", e),
            })?;
        let tokenizer = load_tokenizer_with_truncation(&files.tokenizer, config.max_seq_len)?;

        info!(
            model_path = %model_path.display(),
            hidden_size = model.hidden_size(),
            max_seq_len = config.max_seq_len,
            "Query encoder loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer,
                device,
            },
        })
    }

    pub fn stub() -> Self {
        Self::stub_with_dim(STUB_EMBEDDING_DIM)
    }

    fn stub_with_dim(dim: usize) -> Self {
        Self {
            backend: EncoderBackend::Stub { dim },
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub { .. })
    }

    /// Embeds `text` and L2-normalizes the result.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embedding = match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
            } => Self::embed_with_model(text, model, tokenizer, device)?,
            EncoderBackend::Stub { dim } => Self::embed_stub(text, *dim),
        };
        Ok(normalize(embedding))
    }

    fn embed_with_model(
        text: &str,
        model: &BertEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Ok(vec![0.0; model.hidden_size()]);
        }

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Encoding query"
        );

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = model
            .forward(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("encoder forward pass failed: {}", e),
            })?;

        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Hash-seeded pseudo-random vector: stable for identical text, unrelated otherwise.
    fn embed_stub(text: &str, dim: usize) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        (0..dim)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }
}

fn normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}
