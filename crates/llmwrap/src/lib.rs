//! llmwrap - provider wrappers for text generation and feature extraction
//!
//! This crate is the aggregation surface: it re-exports the six wrapper
//! types from the HuggingFace and OpenAI wrapper crates, plus the
//! contract traits and request/response types they speak.
//!
//! The wrappers:
//! - [`HfApiFeatureExtractionTask`] / [`HfApiTextGenerationTask`] - the
//!   hosted HuggingFace Inference API
//! - [`HfFeatureExtractionTask`] / [`HfTextGenerationTask`] - the local
//!   candle pipeline equivalents
//! - [`OpenAiChatModel`] / [`OpenAiEmbeddingModel`] - the OpenAI API

pub use llmwrap_hf::{
    HfApiFeatureExtractionTask, HfApiTextGenerationTask, HfFeatureExtractionTask,
    HfTextGenerationTask,
};
pub use llmwrap_openai::{OpenAiChatModel, OpenAiEmbeddingModel};

pub use llmwrap_wrapper_api::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, EmbeddingModel, FeatureExtractionTask,
    GenerationChunk, GenerationRequest, GenerationResponse, PipelineStatus, TaskError,
    TextGenerationTask, WrapperCaps,
};
