use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A model known to the local registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub source: ModelSource,
    pub kind: ModelKind,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub files: Vec<String>,
    pub downloaded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelSource {
    HuggingFace { repo_id: String },
    Local,
}

/// The task a model serves. Only the two wrapper tasks are first-class;
/// everything else the Hub reports is kept as Unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ModelKind {
    TextGeneration,
    FeatureExtraction,
    Unknown,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::TextGeneration => "text-generation",
            ModelKind::FeatureExtraction => "feature-extraction",
            ModelKind::Unknown => "unknown",
        }
    }

    pub fn from_pipeline_tag(tag: &str) -> Self {
        match tag {
            "text-generation" | "text2text-generation" => ModelKind::TextGeneration,
            "feature-extraction" | "sentence-similarity" => ModelKind::FeatureExtraction,
            _ => ModelKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_tags_map_to_wrapper_tasks() {
        assert_eq!(
            ModelKind::from_pipeline_tag("text-generation"),
            ModelKind::TextGeneration
        );
        assert_eq!(
            ModelKind::from_pipeline_tag("text2text-generation"),
            ModelKind::TextGeneration
        );
        assert_eq!(
            ModelKind::from_pipeline_tag("feature-extraction"),
            ModelKind::FeatureExtraction
        );
        assert_eq!(
            ModelKind::from_pipeline_tag("sentence-similarity"),
            ModelKind::FeatureExtraction
        );
    }

    #[test]
    fn unrelated_pipeline_tags_are_unknown() {
        assert_eq!(
            ModelKind::from_pipeline_tag("text-to-image"),
            ModelKind::Unknown
        );
        assert_eq!(ModelKind::from_pipeline_tag(""), ModelKind::Unknown);
    }
}
