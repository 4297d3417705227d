use anyhow::Result;
use async_trait::async_trait;
use llmwrap_wrapper_api::{
    GenerationChunk, GenerationRequest, GenerationResponse, TaskError, TextGenerationTask,
    WrapperCaps,
};
use serde::{Deserialize, Serialize};

use super::{truncate_body, HfApiClient, HfApiOptions};

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    do_sample: bool,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct ApiGenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
    options: &'a HfApiOptions,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

/// Text generation against the hosted Inference API.
pub struct HfApiTextGenerationTask {
    client: HfApiClient,
    model: String,
    options: HfApiOptions,
}

impl HfApiTextGenerationTask {
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

    fn parameters(request: &GenerationRequest) -> GenerationParameters {
        // Temperature 0 means greedy decoding; the API wants sampling
        // switched off rather than a zero temperature.
        let sampling = request.temperature > 0.0;
        GenerationParameters {
            max_new_tokens: request.max_new_tokens,
            temperature: sampling.then_some(request.temperature),
            top_p: sampling.then_some(request.top_p),
            do_sample: sampling,
            return_full_text: false,
        }
    }

    async fn call(&self, request: &GenerationRequest) -> Result<String, TaskError> {
        let url = self.client.model_url(&self.model);
        let body = ApiGenerationRequest {
            inputs: &request.prompt,
            parameters: Self::parameters(request),
            options: &self.options,
        };

        tracing::debug!("Text generation request to {}", url);

        let response = self.client.post_json(&url, &body).await?;
        let body = response.text().await.map_err(TaskError::Http)?;

        let outputs: Vec<GeneratedText> = serde_json::from_str(&body).map_err(|e| {
            TaskError::UnexpectedResponse(format!("{}: {}", e, truncate_body(&body, 200)))
        })?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.generated_text)
            .ok_or_else(|| TaskError::UnexpectedResponse("empty generation result".to_string()))
    }
}

#[async_trait]
impl TextGenerationTask for HfApiTextGenerationTask {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            text_generation: true,
            ..WrapperCaps::default()
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let text = self.call(&request).await?;
        Ok(GenerationResponse {
            text,
            // Usage is not reported by the serverless endpoint
            tokens_generated: 0,
            finish_reason: "stop".to_string(),
        })
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<GenerationChunk>> {
        // The serverless endpoint answers in one piece; emit it as a
        // single chunk followed by the terminal marker.
        let text = self.call(&request).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(4);
        let _ = tx
            .send(GenerationChunk {
                content: text,
                finish_reason: None,
            })
            .await;
        let _ = tx
            .send(GenerationChunk {
                content: String::new(),
                finish_reason: Some("stop".to_string()),
            })
            .await;

        Ok(rx)
    }
}
