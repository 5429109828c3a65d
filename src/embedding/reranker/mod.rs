//! Cross-encoder relevance model.
//!
//! Scores are probabilities: the model's raw logit passed through a sigmoid. Without a model
//! directory the reranker runs a lexical stub that is deterministic and also lands in `[0, 1]`.

pub mod config;
pub mod error;


pub use config::{MAX_SEQ_LEN, RerankerConfig};
pub use error::RerankerError;

use std::collections::HashSet;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::embedding::bert::BertClassifier;
use crate::embedding::device::select_device;
use crate::embedding::utils::{ModelFiles, load_tokenizer_with_truncation};

/// Words ignored by the lexical stub.
const STUB_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "of", "on", "or",
    "the", "to", "with", "ao", "aos", "com", "da", "das", "de", "do", "dos", "e", "em", "na",
    "nas", "no", "nos", "o", "os", "para", "pela", "pelo", "por", "que", "um", "uma",
];

pub struct Reranker {
    model: Option<(BertClassifier, Tokenizer, Device)>,
    config: RerankerConfig,
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("device", &self.model.as_ref().map(|(_, _, d)| format!("{:?}", d)))
            .field("config", &self.config)
            .field("model_loaded", &self.is_model_loaded())
            .finish()
    }
}

impl Reranker {
    pub fn load(config: RerankerConfig) -> Result<Self, RerankerError> {
        config
            .validate()
            .map_err(|reason| RerankerError::InvalidConfig { reason })?;

        let Some(model_path) = config.model_path.clone() else {
            info!("No reranker model path configured, operating in stub mode");
            return Ok(Self {
                model: None,
                config,
            });
        };

        let files = ModelFiles::locate(&model_path)?;
        let device = select_device()?;
        debug!(?device, "Selected compute device for reranker");

        info!(model_path = %model_path.display(), "Loading reranker model");

        let model =
            BertClassifier::load(&files, &device).map_err(|e| RerankerError::ModelLoadFailed {
                reason: format!("Failed to load cross-encoder: {}", e),
            })?;
        let tokenizer = load_tokenizer_with_truncation(&files.tokenizer, config.max_seq_len)?;

        info!("Reranker model loaded successfully");

        Ok(Self {
            model: Some((model, tokenizer, device)),
            config,
        })
    }

    pub fn stub() -> Result<Self, RerankerError> {
        Self::load(RerankerConfig::stub())
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &RerankerConfig {
        &self.config
    }

    /// Scores how relevant `candidate` is to `query`, in `[0, 1]`.
    pub fn score(&self, query: &str, candidate: &str) -> Result<f32, RerankerError> {
        let score = match &self.model {
            Some((model, tokenizer, device)) => {
                let logit = Self::logit(model, tokenizer, device, query, candidate)?;
                sigmoid(logit)
            }
            None => lexical_score(query, candidate),
        };

        if !score.is_finite() {
            return Err(RerankerError::NonFiniteScore);
        }

        debug!(
            query_len = query.len(),
            candidate_len = candidate.len(),
            score,
            "Scored pair"
        );

        Ok(score.clamp(0.0, 1.0))
    }

    fn logit(
        model: &BertClassifier,
        tokenizer: &Tokenizer,
        device: &Device,
        query: &str,
        candidate: &str,
    ) -> Result<f32, RerankerError> {
        let tokens = tokenizer.encode((query, candidate), true).map_err(|e| {
            RerankerError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let token_ids = Tensor::new(tokens.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(tokens.get_attention_mask(), device)?.unsqueeze(0)?;

        let logits = model.forward(&token_ids, &type_ids, &attention_mask)?;

        logits
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| RerankerError::InferenceFailed {
                reason: "empty logits".to_string(),
            })
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Recall/Jaccard blend of content words, squashed around 0.5.
fn lexical_score(query: &str, candidate: &str) -> f32 {
    let query_lower = query.to_lowercase();
    let candidate_lower = candidate.to_lowercase();
    let query_words = content_words(&query_lower);
    let candidate_words = content_words(&candidate_lower);

    if query_words.is_empty() || candidate_words.is_empty() {
        return 0.0;
    }

    let matches = query_words.intersection(&candidate_words).count();
    let recall = matches as f32 / query_words.len() as f32;
    let union = query_words.union(&candidate_words).count();
    let jaccard = matches as f32 / union as f32;

    sigmoid(8.0 * (0.6 * recall + 0.4 * jaccard - 0.5))
}

fn content_words(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STUB_STOP_WORDS.contains(w))
        .collect()
}
