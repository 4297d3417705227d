//! Model loading and generation for the local text-generation pipeline

use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::llama as llama_model;
use candle_transformers::models::phi as phi_model;
use llmwrap_wrapper_api::{GenerationChunk, GenerationRequest};
use std::path::Path;
use std::sync::Mutex;
use tokenizers::Tokenizer;

use super::sampling::Sampler;
use super::{dtype_for, find_file, find_weights};

pub struct GenerationOutcome {
    pub text: String,
    pub tokens_generated: usize,
    pub finish_reason: String,
}

pub struct GenerationModel {
    arch: Arch,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    eos_token_id: Option<u32>,
}

enum Arch {
    Llama {
        model: llama_model::Llama,
        config: llama_model::Config,
    },
    Phi(Mutex<phi_model::Model>),
}

/// Per-generation decoding state: llama keeps its KV cache outside the
/// model, phi keeps it inside and only needs a reset.
enum Session {
    Llama(llama_model::Cache),
    Phi,
}

impl GenerationModel {
    pub fn load(model_dir: &Path, device: &Device) -> Result<Self> {
        tracing::info!("Loading model from {:?}", model_dir);

        let dtype = dtype_for(device);

        let config_path = find_file(model_dir, "config.json")?;
        let tokenizer_path = find_file(model_dir, "tokenizer.json")?;
        let weights = find_weights(model_dir)?;

        tracing::info!("Config: {:?}", config_path);
        tracing::info!("Tokenizer: {:?}", tokenizer_path);
        tracing::info!("Weights: {} shard(s)", weights.len());

        // Load config to determine model type
        let config_str = std::fs::read_to_string(&config_path)?;
        let config_json: serde_json::Value = serde_json::from_str(&config_str)?;

        let model_type = config_json
            .get("model_type")
            .and_then(|v| v.as_str())
            .unwrap_or("llama");

        tracing::info!("Model type: {}", model_type);

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let eos_token_id = get_eos_token_id(&tokenizer);
        tracing::info!("EOS token ID: {:?}", eos_token_id);

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, dtype, device)? };

        let arch = match model_type {
            "phi" | "phi-msft" | "phi2" => {
                tracing::info!("Loading Phi model");
                let config: phi_model::Config = serde_json::from_str(&config_str)?;
                let model = phi_model::Model::new(&config, vb)?;
                Arch::Phi(Mutex::new(model))
            }
            _ => {
                // Default to Llama for llama, mistral, etc.
                tracing::info!("Loading Llama-style model");
                let config: llama_model::LlamaConfig = serde_json::from_str(&config_str)?;
                let config = config.into_config(false); // use_flash_attn = false
                let model = llama_model::Llama::load(vb, &config)?;
                Arch::Llama { model, config }
            }
        };

        Ok(Self {
            arch,
            tokenizer,
            device: device.clone(),
            dtype,
            eos_token_id,
        })
    }

    fn begin(&self) -> Result<Session> {
        match &self.arch {
            Arch::Llama { config, .. } => Ok(Session::Llama(llama_model::Cache::new(
                true,
                self.dtype,
                config,
                &self.device,
            )?)),
            Arch::Phi(model) => {
                model.lock().unwrap().clear_kv_cache();
                Ok(Session::Phi)
            }
        }
    }

    /// One decoding step: feed `context` at position `index_pos` and
    /// return the logits for its last token.
    fn forward(&self, session: &mut Session, context: &[u32], index_pos: usize) -> Result<Tensor> {
        let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
        let logits = match (&self.arch, session) {
            (Arch::Llama { model, .. }, Session::Llama(cache)) => {
                model.forward(&input, index_pos, cache)?
            }
            (Arch::Phi(model), Session::Phi) => model.lock().unwrap().forward(&input)?,
            _ => anyhow::bail!("decoding session does not match model architecture"),
        };
        Ok(logits.squeeze(0)?)
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(|e| anyhow::anyhow!("Decode error: {}", e))
    }

    pub fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let encoding = self
            .tokenizer
            .encode(request.prompt.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {}", e))?;

        let prompt_len = encoding.get_ids().len();
        let mut all_tokens = encoding.get_ids().to_vec();

        let mut sampler = Sampler::new(
            request.temperature,
            request.top_p,
            request.seed.unwrap_or(42),
        );
        let mut session = self.begin()?;

        let mut index_pos = 0;
        let mut generated = 0;
        let mut finish_reason = "length".to_string();

        for step in 0..request.max_new_tokens as usize {
            let context_start = if step == 0 { 0 } else { all_tokens.len() - 1 };
            let logits = self.forward(&mut session, &all_tokens[context_start..], index_pos)?;
            index_pos = all_tokens.len();

            let next_token = sampler.sample(&logits)?;

            if Some(next_token) == self.eos_token_id {
                finish_reason = "stop".to_string();
                break;
            }

            all_tokens.push(next_token);
            generated += 1;

            if !request.stop.is_empty() {
                let text = self.decode(&all_tokens[prompt_len..])?;
                if let Some(pos) = find_stop(&text, &request.stop) {
                    let mut text = text;
                    text.truncate(pos);
                    return Ok(GenerationOutcome {
                        text,
                        tokens_generated: generated,
                        finish_reason: "stop".to_string(),
                    });
                }
            }
        }

        let text = self.decode(&all_tokens[prompt_len..])?;
        Ok(GenerationOutcome {
            text,
            tokens_generated: generated,
            finish_reason,
        })
    }

    pub async fn generate_stream(
        &self,
        request: &GenerationRequest,
        tx: tokio::sync::mpsc::Sender<GenerationChunk>,
    ) -> Result<()> {
        let encoding = self
            .tokenizer
            .encode(request.prompt.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {}", e))?;

        let prompt_len = encoding.get_ids().len();
        let mut all_tokens = encoding.get_ids().to_vec();

        let mut sampler = Sampler::new(
            request.temperature,
            request.top_p,
            request.seed.unwrap_or(42),
        );
        let mut session = self.begin()?;

        let mut index_pos = 0;
        let mut prev_text_len = 0;

        for step in 0..request.max_new_tokens as usize {
            let context_start = if step == 0 { 0 } else { all_tokens.len() - 1 };
            let logits = self.forward(&mut session, &all_tokens[context_start..], index_pos)?;
            index_pos = all_tokens.len();

            let next_token = sampler.sample(&logits)?;

            if Some(next_token) == self.eos_token_id {
                let _ = tx
                    .send(GenerationChunk {
                        content: String::new(),
                        finish_reason: Some("stop".to_string()),
                    })
                    .await;
                return Ok(());
            }

            all_tokens.push(next_token);

            // Decode current text and send the delta
            let current_text = self.decode(&all_tokens[prompt_len..])?;

            if !request.stop.is_empty() && find_stop(&current_text, &request.stop).is_some() {
                let _ = tx
                    .send(GenerationChunk {
                        content: String::new(),
                        finish_reason: Some("stop".to_string()),
                    })
                    .await;
                return Ok(());
            }

            if current_text.len() > prev_text_len {
                let delta = current_text[prev_text_len..].to_string();
                prev_text_len = current_text.len();

                if tx
                    .send(GenerationChunk {
                        content: delta,
                        finish_reason: None,
                    })
                    .await
                    .is_err()
                {
                    // Receiver dropped
                    return Ok(());
                }
            }

            // Small yield to allow other tasks
            if step % 10 == 0 {
                tokio::task::yield_now().await;
            }
        }

        let _ = tx
            .send(GenerationChunk {
                content: String::new(),
                finish_reason: Some("length".to_string()),
            })
            .await;

        Ok(())
    }
}

/// Byte offset of the earliest stop-string match, if any.
fn find_stop(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}

fn get_eos_token_id(tokenizer: &Tokenizer) -> Option<u32> {
    let vocab = tokenizer.get_vocab(true);
    vocab
        .get("</s>")
        .or_else(|| vocab.get("<|endoftext|>"))
        .or_else(|| vocab.get("<eos>"))
        .or_else(|| vocab.get("<|end|>"))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_stop_match_wins() {
        let stops = vec!["###".to_string(), "\n\n".to_string()];
        assert_eq!(find_stop("one\n\ntwo###", &stops), Some(3));
    }

    #[test]
    fn no_stop_strings_means_no_match() {
        assert_eq!(find_stop("anything at all", &[]), None);
        let stops = vec!["###".to_string()];
        assert_eq!(find_stop("no marker here", &stops), None);
    }

    #[test]
    fn empty_stop_strings_are_ignored() {
        let stops = vec![String::new()];
        assert_eq!(find_stop("text", &stops), None);
    }
}
