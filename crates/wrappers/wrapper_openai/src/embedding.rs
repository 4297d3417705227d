use anyhow::Result;
use async_trait::async_trait;
use llmwrap_wrapper_api::{EmbeddingModel, TaskError, WrapperCaps};
use serde::{Deserialize, Serialize};

use crate::{resolve_api_key, resolve_base_url};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Embedding client for the OpenAI API.
pub struct OpenAiEmbeddingModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: Option<u32>,
}

impl OpenAiEmbeddingModel {
    pub fn new(model: &str, api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: resolve_base_url(),
            model: model.to_string(),
            dimensions: None,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ask the API for truncated vectors (text-embedding-3 models only).
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn known_dimension(model: &str) -> Option<usize> {
        match model {
            "text-embedding-3-large" => Some(3072),
            "text-embedding-3-small" => Some(1536),
            "text-embedding-ada-002" => Some(1536),
            _ => None,
        }
    }

    /// Re-order response rows by their reported index.
    fn in_input_order(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
        data.sort_by_key(|d| d.index);
        data.into_iter().map(|d| d.embedding).collect()
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddingModel {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            embeddings: true,
            ..WrapperCaps::default()
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.dimensions,
        };

        tracing::debug!("Embedding request: {} texts", texts.len());

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(TaskError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TaskError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(TaskError::Http)?;
        if parsed.data.len() != texts.len() {
            return Err(TaskError::UnexpectedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            ))
            .into());
        }

        Ok(Self::in_input_order(parsed.data))
    }

    fn dimension(&self) -> Option<usize> {
        self.dimensions
            .map(|d| d as usize)
            .or_else(|| Self::known_dimension(&self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_report_their_dimension() {
        assert_eq!(
            OpenAiEmbeddingModel::known_dimension("text-embedding-3-large"),
            Some(3072)
        );
        assert_eq!(
            OpenAiEmbeddingModel::known_dimension("text-embedding-3-small"),
            Some(1536)
        );
        assert_eq!(
            OpenAiEmbeddingModel::known_dimension("text-embedding-ada-002"),
            Some(1536)
        );
        assert_eq!(OpenAiEmbeddingModel::known_dimension("mystery"), None);
    }

    #[test]
    fn response_rows_come_back_in_input_order() {
        let data = vec![
            EmbeddingData {
                embedding: vec![2.0],
                index: 1,
            },
            EmbeddingData {
                embedding: vec![1.0],
                index: 0,
            },
        ];
        let ordered = OpenAiEmbeddingModel::in_input_order(data);
        assert_eq!(ordered, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn dimensions_are_omitted_from_the_body_unless_set() {
        let texts = vec!["a".to_string()];
        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &texts,
            dimensions: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("dimensions").is_none());
        assert_eq!(value["input"][0], "a");

        let body = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &texts,
            dimensions: Some(256),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["dimensions"], 256);
    }

    #[test]
    fn embedding_response_parses_wire_body() {
        let body = r#"{
            "object": "list",
            "data": [{"object": "embedding", "embedding": [0.1, 0.2], "index": 0}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 2, "total_tokens": 2}
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
    }
}
