//! BERT-family models loaded from safetensors.
//!
//! [`BertClassifier`] is a cross-encoder with a single-logit head.
//! [`BertEncoder`] is a sentence encoder with masked mean pooling.

use candle::{DType, Device, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::sync::Arc;

use super::utils::ModelFiles;

fn load_var_builder(files: &ModelFiles, device: &Device) -> Result<(VarBuilder<'static>, Config)> {
    let config_content = std::fs::read_to_string(&files.config)?;
    let config: Config = serde_json::from_str(&config_content)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;

    // SAFETY: the weights file is not modified while mapped.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[files.weights.as_path()], DType::F32, device)?
    };
    Ok((vb, config))
}

/// Loads the encoder body, accepting `bert.`/`roberta.` prefixes or bare weights.
fn load_body(vb: &VarBuilder, config: &Config) -> Result<BertModel> {
    if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("bert"), config)
    } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("roberta"), config)
    } else {
        BertModel::load(vb.clone(), config)
    }
}

struct ClassifierInner {
    bert: BertModel,
    head: Linear,
}

/// Cross-encoder returning one relevance logit per (query, candidate) pair.
#[derive(Clone)]
pub struct BertClassifier(Arc<ClassifierInner>);

impl BertClassifier {
    pub fn load(files: &ModelFiles, device: &Device) -> Result<Self> {
        let (vb, config) = load_var_builder(files, device)?;
        let bert = load_body(&vb, &config)?;
        let head = candle_nn::linear(config.hidden_size, 1, vb.pp("classifier"))?;
        Ok(Self(Arc::new(ClassifierInner { bert, head })))
    }

    /// Returns logits of shape `[batch, 1]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .0
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;
        let cls = hidden.i((.., 0, ..))?;
        self.0.head.forward(&cls)
    }
}

/// Sentence encoder producing mean-pooled hidden states.
#[derive(Clone)]
pub struct BertEncoder {
    bert: Arc<BertModel>,
    hidden_size: usize,
}

impl BertEncoder {
    pub fn load(files: &ModelFiles, device: &Device) -> Result<Self> {
        let (vb, config) = load_var_builder(files, device)?;
        let bert = load_body(&vb, &config)?;
        Ok(Self {
            bert: Arc::new(bert),
            hidden_size: config.hidden_size,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Returns pooled embeddings of shape `[batch, hidden]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .bert
            .forward(input_ids, token_type_ids, Some(attention_mask))?;

        // [batch, seq] -> [batch, seq, 1]
        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
        summed.broadcast_div(&counts)
    }
}
