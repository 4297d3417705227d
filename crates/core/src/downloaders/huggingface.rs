use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use super::Downloader;
use crate::models::{ModelInfo, ModelKind, ModelSource};
use crate::registry::ModelRegistry;

const HF_API_BASE: &str = "https://huggingface.co/api";
const HF_CDN_BASE: &str = "https://huggingface.co";

/// Downloads model repositories from the HuggingFace Hub into the local
/// model store, keeping only the files the candle pipelines can read.
pub struct HubDownloader {
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HubModelInfo {
    pub id: String,
    #[serde(default)]
    pub pipeline_tag: Option<String>,
    #[serde(default)]
    pub siblings: Vec<HubSibling>,
}

#[derive(Debug, Deserialize)]
pub struct HubSibling {
    pub rfilename: String,
}

impl HubDownloader {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("llmwrap/0.1.0")
                .build()
                .expect("Failed to create HTTP client"),
            token,
        }
    }

    pub async fn get_model_info(&self, repo_id: &str) -> Result<HubModelInfo> {
        let url = format!("{}/models/{}", HF_API_BASE, repo_id);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to fetch model info")?;

        if !response.status().is_success() {
            anyhow::bail!("Model '{}' not found on HuggingFace", repo_id);
        }

        let info: HubModelInfo = response.json().await?;
        Ok(info)
    }

    /// Pick the files the local pipelines need: the config, the tokenizer
    /// and every safetensors shard. GGUF and pytorch checkpoints are left
    /// on the Hub since candle only reads safetensors here.
    fn select_files(model_info: &HubModelInfo, requested_file: Option<&str>) -> Vec<String> {
        if let Some(file) = requested_file {
            return vec![file.to_string()];
        }

        model_info
            .siblings
            .iter()
            .filter(|s| {
                s.rfilename.ends_with(".safetensors")
                    || s.rfilename == "config.json"
                    || s.rfilename == "tokenizer.json"
                    || s.rfilename == "tokenizer_config.json"
            })
            .map(|s| s.rfilename.clone())
            .collect()
    }

    async fn download_file(
        &self,
        repo_id: &str,
        filename: &str,
        dest_dir: &PathBuf,
    ) -> Result<u64> {
        let url = format!("{}/{}/resolve/main/{}", HF_CDN_BASE, repo_id, filename);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.context("Failed to start download")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to download {}: {}", filename, response.status());
        }

        let total_size = response.content_length().unwrap_or(0);

        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
                .progress_chars("#>-"),
        );
        pb.set_message(filename.to_string());

        // Create subdirectories if needed
        let dest_path = dest_dir.join(filename);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&dest_path)?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Error downloading chunk")?;
            file.write_all(&chunk)?;
            downloaded += chunk.len() as u64;
            pb.set_position(downloaded);
        }

        pb.finish_with_message(format!("Downloaded {}", filename));
        Ok(downloaded)
    }
}

impl Default for HubDownloader {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Downloader for HubDownloader {
    async fn download(&self, model_id: &str, file: Option<&str>) -> Result<ModelInfo> {
        tracing::info!("Fetching model info for {}", model_id);
        let hub_info = self.get_model_info(model_id).await?;

        let kind = hub_info
            .pipeline_tag
            .as_ref()
            .map(|t| ModelKind::from_pipeline_tag(t))
            .unwrap_or(ModelKind::Unknown);

        // Create model directory
        let models_dir = ModelRegistry::models_dir()?;
        let model_name = model_id.replace('/', "--");
        let model_dir = models_dir.join(&model_name);
        fs::create_dir_all(&model_dir)?;

        // Select and download files
        let files_to_download = Self::select_files(&hub_info, file);

        if files_to_download.is_empty() {
            anyhow::bail!("No suitable files found for model '{}'", model_id);
        }

        tracing::info!(
            "Downloading {} file(s) to {:?}",
            files_to_download.len(),
            model_dir
        );

        let mut total_size = 0u64;
        for filename in &files_to_download {
            total_size += self.download_file(model_id, filename, &model_dir).await?;
        }

        Ok(ModelInfo {
            name: model_name,
            source: ModelSource::HuggingFace {
                repo_id: model_id.to_string(),
            },
            kind,
            path: model_dir,
            size_bytes: total_size,
            files: files_to_download,
            downloaded_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_files(files: &[&str]) -> HubModelInfo {
        HubModelInfo {
            id: "org/model".to_string(),
            pipeline_tag: Some("text-generation".to_string()),
            siblings: files
                .iter()
                .map(|f| HubSibling {
                    rfilename: f.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn selects_safetensors_and_tokenizer_files() {
        let info = info_with_files(&[
            "config.json",
            "tokenizer.json",
            "tokenizer_config.json",
            "model.safetensors",
            "pytorch_model.bin",
            "model.gguf",
            "README.md",
        ]);

        let selected = HubDownloader::select_files(&info, None);
        assert_eq!(
            selected,
            vec![
                "config.json",
                "tokenizer.json",
                "tokenizer_config.json",
                "model.safetensors",
            ]
        );
    }

    #[test]
    fn selects_every_safetensors_shard() {
        let info = info_with_files(&[
            "config.json",
            "tokenizer.json",
            "model-00001-of-00002.safetensors",
            "model-00002-of-00002.safetensors",
        ]);

        let selected = HubDownloader::select_files(&info, None);
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn explicit_file_request_wins() {
        let info = info_with_files(&["config.json", "model.safetensors"]);
        let selected = HubDownloader::select_files(&info, Some("tokenizer.json"));
        assert_eq!(selected, vec!["tokenizer.json"]);
    }
}
