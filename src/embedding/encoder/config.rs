use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Output dimension in stub mode (matches MiniLM-class encoders).
pub const STUB_EMBEDDING_DIM: usize = 384;

/// Max tokens encoded per query.
pub const ENCODER_MAX_SEQ_LEN: usize = 256;

/// Configuration for [`QueryEncoder`](super::QueryEncoder).
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Model directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// `None` selects the deterministic stub.
    pub model_path: Option<PathBuf>,
    pub max_seq_len: usize,
    /// Embedding dimension produced by the stub.
    pub stub_dim: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: ENCODER_MAX_SEQ_LEN,
            stub_dim: STUB_EMBEDDING_DIM,
        }
    }
}

impl EncoderConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }
        if self.stub_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "stub_dim must be greater than zero".to_string(),
            });
        }
        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_path cannot be empty when provided".to_string(),
            });
        }
        Ok(())
    }
}
