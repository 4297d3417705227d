//! llmwrap_core - Core library for model management
//!
//! This crate provides:
//! - HuggingFace Hub client and model downloads
//! - Local model repository and registry
//! - Model metadata and types
//! - Configuration

pub mod config;
pub mod downloaders;
pub mod models;
pub mod registry;

pub use config::Config;
pub use models::{ModelInfo, ModelKind, ModelSource};
pub use registry::ModelRegistry;
