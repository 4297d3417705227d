//! BERT-family sentence encoder for the local feature-extraction pipeline

use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use std::path::Path;
use tokenizers::{PaddingParams, Tokenizer};

use super::{find_file, find_weights};

pub struct SentenceEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    normalize: bool,
}

impl SentenceEncoder {
    pub fn load(model_dir: &Path, device: &Device, normalize: bool) -> Result<Self> {
        tracing::info!("Loading encoder from {:?}", model_dir);

        let config_path = find_file(model_dir, "config.json")?;
        let tokenizer_path = find_file(model_dir, "tokenizer.json")?;
        let weights = find_weights(model_dir)?;

        let config_str = std::fs::read_to_string(&config_path)?;
        let config: BertConfig = serde_json::from_str(&config_str)?;
        let hidden_size = config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        // Pad batches to the longest sequence
        tokenizer.with_padding(Some(PaddingParams::default()));

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, DTYPE, device)? };
        let model = BertModel::load(vb, &config)?;

        Ok(Self {
            model,
            tokenizer,
            device: device.clone(),
            hidden_size,
            normalize,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// One vector per input text: masked mean pooling over the token
    /// axis, optionally L2-normalized.
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {}", e))?;

        let seq_len = encodings[0].get_ids().len();
        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let input_ids = Tensor::from_vec(ids, (texts.len(), seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (texts.len(), seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Masked mean pooling over tokens
        let mask_f = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask_f)?.sum(1)?;
        let counts = mask_f.sum(1)?;
        let mut pooled = summed.broadcast_div(&counts)?;

        if self.normalize {
            let norm = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
            pooled = pooled.broadcast_div(&norm)?;
        }

        Ok(pooled.to_vec2::<f32>()?)
    }
}
