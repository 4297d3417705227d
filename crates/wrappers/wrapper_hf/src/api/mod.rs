pub mod feature_extraction;
pub mod text_generation;

pub use feature_extraction::HfApiFeatureExtractionTask;
pub use text_generation::HfApiTextGenerationTask;

use llmwrap_core::Config;
use llmwrap_wrapper_api::TaskError;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const HF_INFERENCE_BASE: &str = "https://api-inference.huggingface.co";

/// Options forwarded to the Inference API with every request
#[derive(Debug, Clone, Serialize)]
pub struct HfApiOptions {
    pub wait_for_model: bool,
    pub use_cache: bool,
}

impl Default for HfApiOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
            use_cache: true,
        }
    }
}

/// Shared HTTP client for the hosted Inference API.
///
/// The bearer token is resolved from the explicit argument, then the
/// HF_API_TOKEN environment variable, then the config file. Public
/// models work without one.
#[derive(Debug, Clone)]
pub struct HfApiClient {
    client: Client,
    base_url: String,
    endpoint: Option<String>,
    token: Option<String>,
}

impl HfApiClient {
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .or_else(|| std::env::var("HF_API_TOKEN").ok())
            .or_else(|| Config::load().ok().and_then(|c| c.models.hf_token));

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .user_agent("llmwrap/0.1.0")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: HF_INFERENCE_BASE.to_string(),
            endpoint: None,
            token,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Route every call to a dedicated Inference Endpoint instead of the
    /// serverless API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn model_url(&self, model_id: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}/models/{}", self.base_url, model_id),
        }
    }

    pub(crate) async fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, TaskError> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TaskError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

/// Clip a response body for error messages without splitting a
/// multi-byte character.
pub(crate) fn truncate_body(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
