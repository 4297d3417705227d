use anyhow::Result;
use async_trait::async_trait;
use llmwrap_wrapper_api::{FeatureExtractionTask, TaskError, WrapperCaps};
use serde::{Deserialize, Serialize};

use super::{truncate_body, HfApiClient, HfApiOptions};

#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    inputs: &'a [String],
    options: &'a HfApiOptions,
}

/// The Inference API answers feature-extraction calls in several shapes
/// depending on the model; all of them are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionResponse {
    /// One vector per input: `[[f32, ...], ...]`
    Matrix(Vec<Vec<f32>>),
    /// Token-level vectors per input: `[[[f32, ...], ...], ...]`
    TokenLevel(Vec<Vec<Vec<f32>>>),
    /// A lone vector for a single input: `[f32, ...]`
    Single(Vec<f32>),
    /// Error reported in a 200 body
    Error { error: String },
}

/// Feature extraction against the hosted Inference API.
pub struct HfApiFeatureExtractionTask {
    client: HfApiClient,
    model: String,
    options: HfApiOptions,
}

impl HfApiFeatureExtractionTask {
    pub fn new(model: &str, token: Option<String>) -> Self {
        Self::with_client(model, HfApiClient::new(token))
    }

    pub fn with_client(model: &str, client: HfApiClient) -> Self {
        Self {
            client,
            model: model.to_string(),
            options: HfApiOptions::default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn parse_embeddings(
        response: ExtractionResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, TaskError> {
        match response {
            ExtractionResponse::Matrix(rows) => {
                // A single input can come back token-level, which parses
                // as a matrix of the wrong height; pool it down.
                if expected == 1 && rows.len() != 1 {
                    return Ok(vec![mean_pool(&rows)]);
                }
                Ok(rows)
            }
            ExtractionResponse::TokenLevel(inputs) => {
                Ok(inputs.iter().map(|tokens| mean_pool(tokens)).collect())
            }
            ExtractionResponse::Single(vector) => Ok(vec![vector]),
            ExtractionResponse::Error { error } => Err(TaskError::Api {
                status: 200,
                message: error,
            }),
        }
    }
}

/// Average token vectors into one sentence vector.
fn mean_pool(tokens: &[Vec<f32>]) -> Vec<f32> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let dim = tokens[0].len();
    let mut pooled = vec![0f32; dim];
    for vector in tokens {
        for (acc, value) in pooled.iter_mut().zip(vector) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    for value in &mut pooled {
        *value /= count;
    }
    pooled
}

fn known_dimension(model: &str) -> Option<usize> {
    match model {
        m if m.contains("bge-large") => Some(1024),
        m if m.contains("bge-base") => Some(768),
        m if m.contains("bge-small") => Some(384),
        m if m.contains("bge-m3") => Some(1024),
        m if m.contains("MiniLM-L6") || m.contains("MiniLM-L12") => Some(384),
        m if m.contains("mpnet-base") => Some(768),
        m if m.contains("e5-large") => Some(1024),
        m if m.contains("e5-base") => Some(768),
        m if m.contains("e5-small") => Some(384),
        _ => None,
    }
}

#[async_trait]
impl FeatureExtractionTask for HfApiFeatureExtractionTask {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            feature_extraction: true,
            ..WrapperCaps::default()
        }
    }

    async fn extract(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.client.model_url(&self.model);
        let body = ExtractionRequest {
            inputs: texts,
            options: &self.options,
        };

        tracing::debug!("Feature extraction request to {}: {} texts", url, texts.len());

        let response = self.client.post_json(&url, &body).await?;
        let body = response.text().await.map_err(TaskError::Http)?;

        let parsed: ExtractionResponse = serde_json::from_str(&body).map_err(|e| {
            TaskError::UnexpectedResponse(format!("{}: {}", e, truncate_body(&body, 200)))
        })?;

        let embeddings = Self::parse_embeddings(parsed, texts.len())?;
        if embeddings.len() != texts.len() {
            return Err(TaskError::UnexpectedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            ))
            .into());
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> Option<usize> {
        known_dimension(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str, expected: usize) -> Result<Vec<Vec<f32>>, TaskError> {
        let response: ExtractionResponse = serde_json::from_str(json).unwrap();
        HfApiFeatureExtractionTask::parse_embeddings(response, expected)
    }

    #[test]
    fn matrix_response_passes_through() {
        let embeddings = parse("[[1.0, 2.0], [3.0, 4.0]]", 2).unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn single_vector_is_wrapped() {
        let embeddings = parse("[1.0, 2.0, 3.0]", 1).unwrap();
        assert_eq!(embeddings, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn token_level_response_is_mean_pooled() {
        let embeddings = parse("[[[1.0, 2.0], [3.0, 4.0]]]", 1).unwrap();
        assert_eq!(embeddings, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn single_input_token_matrix_is_pooled() {
        // Token-level answer for one input parses as a 3-row matrix
        let embeddings = parse("[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]", 1).unwrap();
        assert_eq!(embeddings, vec![vec![3.0, 4.0]]);
    }

    #[test]
    fn error_body_is_surfaced() {
        let err = parse(r#"{"error": "Model is currently loading"}"#, 1).unwrap_err();
        assert!(err.to_string().contains("Model is currently loading"));
    }

    #[test]
    fn dimension_table_covers_common_encoders() {
        let task = |m: &str| HfApiFeatureExtractionTask::new(m, Some("hf_test".to_string()));
        assert_eq!(task("BAAI/bge-base-en-v1.5").dimension(), Some(768));
        assert_eq!(task("BAAI/bge-large-en-v1.5").dimension(), Some(1024));
        assert_eq!(
            task("sentence-transformers/all-MiniLM-L6-v2").dimension(),
            Some(384)
        );
        assert_eq!(task("intfloat/e5-small-v2").dimension(), Some(384));
        assert_eq!(task("org/unknown-model").dimension(), None);
    }

    #[test]
    fn request_body_carries_inputs_and_options() {
        let texts = vec!["a".to_string(), "b".to_string()];
        let options = HfApiOptions::default();
        let body = ExtractionRequest {
            inputs: &texts,
            options: &options,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["inputs"][1], "b");
        assert_eq!(value["options"]["wait_for_model"], true);
    }
}
