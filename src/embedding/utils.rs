use std::path::{Path, PathBuf};

use tokenizers::{Tokenizer, TruncationParams};

use super::error::EmbeddingError;

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Files of a Hugging Face style BERT model directory.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    /// Resolves and checks the model files under `model_dir`.
    pub fn locate(model_dir: &Path) -> Result<Self, EmbeddingError> {
        if !model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: model_dir.to_path_buf(),
            });
        }

        let files = Self {
            config: model_dir.join(CONFIG_FILE),
            weights: model_dir.join(WEIGHTS_FILE),
            tokenizer: model_dir.join(TOKENIZER_FILE),
        };

        for path in [&files.config, &files.weights, &files.tokenizer] {
            if !path.is_file() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        Ok(files)
    }
}

/// Loads `tokenizer.json` with truncation at `max_len` tokens.
pub fn load_tokenizer_with_truncation(
    tokenizer_path: &Path,
    max_len: usize,
) -> Result<Tokenizer, EmbeddingError> {
    let mut tokenizer =
        Tokenizer::from_file(tokenizer_path).map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("failed to load {}: {}", tokenizer_path.display(), e),
        })?;

    let truncation = TruncationParams {
        max_length: max_len,
        ..Default::default()
    };

    tokenizer
        .with_truncation(Some(truncation))
        .map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("failed to configure truncation: {}", e),
        })?;

    Ok(tokenizer)
}
