//! llmwrap_hf - HuggingFace wrapper
//!
//! Two flavors of the same two tasks:
//! - `api`: feature extraction and text generation against the hosted
//!   Inference API
//! - `local`: the pipeline equivalents running on candle with models
//!   from the local store

pub mod api;
pub mod local;

pub use api::{HfApiFeatureExtractionTask, HfApiTextGenerationTask};
pub use local::{HfFeatureExtractionTask, HfTextGenerationTask};
