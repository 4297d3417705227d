//! llmwrap_wrapper_api - Wrapper contract traits and types
//!
//! This crate defines the contract for pluggable model wrappers.
//! Each wrapper (HuggingFace API, local candle pipelines, OpenAI)
//! implements these traits.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Capabilities that a wrapper can provide
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WrapperCaps {
    pub text_generation: bool,
    pub feature_extraction: bool,
    pub chat: bool,
    pub embeddings: bool,
    pub streaming: bool,
}

/// Lifecycle status of a local pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    Unloaded,
    Loading,
    Ready,
    Error,
}

/// Chat message for inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Request for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Strings that end generation when they appear in the output
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stop: Vec::new(),
            seed: None,
        }
    }
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

/// Response from text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
    pub tokens_generated: u32,
    pub finish_reason: String,
}

/// A single delta from a streaming generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationChunk {
    pub content: String,
    pub finish_reason: Option<String>,
}

/// Request for chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub stream: bool,
}

fn default_max_tokens() -> u32 {
    2048
}

/// Response from chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub tokens_used: u32,
    pub finish_reason: String,
}

/// Errors shared by every wrapper's wire and pipeline code
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
    #[error("model is not loaded")]
    ModelNotLoaded,
    #[error("missing credentials: {0}")]
    Auth(String),
}

/// A task that turns a prompt into generated text
#[async_trait]
pub trait TextGenerationTask: Send + Sync {
    /// Get the capabilities of this wrapper
    fn caps(&self) -> WrapperCaps;

    /// Run generation (non-streaming)
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Run generation with streaming
    /// Returns a channel receiver for chunks
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<GenerationChunk>>;
}

/// A task that turns texts into one embedding vector each
#[async_trait]
pub trait FeatureExtractionTask: Send + Sync {
    fn caps(&self) -> WrapperCaps;

    /// Embed a batch of texts, one vector per input
    async fn extract(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embedding dimension, when known
    fn dimension(&self) -> Option<usize>;
}

/// A chat-completion model
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn caps(&self) -> WrapperCaps;

    /// Run chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Run chat completion with streaming
    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<GenerationChunk>>;
}

/// An embedding model behind a provider API
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn caps(&self) -> WrapperCaps;

    /// Embed a batch of texts, one vector per input
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embedding dimension, when known
    fn dimension(&self) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_request_fills_defaults() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"prompt": "hello"}"#).unwrap();
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.max_new_tokens, 512);
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.top_p, 0.9);
        assert!(request.stop.is_empty());
        assert!(request.seed.is_none());
    }

    #[test]
    fn chat_request_fills_defaults() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"messages": [{"role": "user", "content": "hi"}]}"#)
                .unwrap();
        assert_eq!(request.max_tokens, 2048);
        assert_eq!(request.temperature, 0.7);
        assert!(!request.stream);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn task_error_messages_name_the_failure() {
        let err = TaskError::Api {
            status: 503,
            message: "model loading".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned 503: model loading");
        assert_eq!(
            TaskError::ModelNotLoaded.to_string(),
            "model is not loaded"
        );
    }
}
