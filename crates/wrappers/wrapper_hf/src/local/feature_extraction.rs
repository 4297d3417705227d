use anyhow::Result;
use async_trait::async_trait;
use llmwrap_wrapper_api::{
    FeatureExtractionTask, PipelineStatus, TaskError, WrapperCaps,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::embedder::SentenceEncoder;
use super::select_device;

/// Local feature-extraction pipeline running a BERT-family encoder on
/// candle.
pub struct HfFeatureExtractionTask {
    status: PipelineStatus,
    normalize: bool,
    dimension: Option<usize>,
    encoder: Arc<RwLock<Option<SentenceEncoder>>>,
}

impl HfFeatureExtractionTask {
    pub fn new() -> Self {
        Self {
            status: PipelineStatus::Unloaded,
            normalize: true,
            dimension: None,
            encoder: Arc::new(RwLock::new(None)),
        }
    }

    /// Toggle L2 normalization of pooled vectors (on by default).
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    pub async fn load(&mut self, model_dir: impl AsRef<Path>) -> Result<()> {
        self.status = PipelineStatus::Loading;
        let model_dir = model_dir.as_ref().to_path_buf();
        tracing::info!("Loading feature-extraction pipeline from {:?}", model_dir);

        let device = select_device()?;
        let normalize = self.normalize;
        let loaded = tokio::task::spawn_blocking(move || {
            SentenceEncoder::load(&model_dir, &device, normalize)
        })
        .await?;

        let loaded = match loaded {
            Ok(encoder) => encoder,
            Err(e) => {
                self.status = PipelineStatus::Error;
                return Err(e);
            }
        };

        self.dimension = Some(loaded.hidden_size());
        *self.encoder.write().await = Some(loaded);
        self.status = PipelineStatus::Ready;

        tracing::info!("Pipeline ready");
        Ok(())
    }

    pub async fn unload(&mut self) -> Result<()> {
        tracing::info!("Unloading feature-extraction pipeline");
        *self.encoder.write().await = None;
        self.dimension = None;
        self.status = PipelineStatus::Unloaded;
        Ok(())
    }
}

impl Default for HfFeatureExtractionTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureExtractionTask for HfFeatureExtractionTask {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            feature_extraction: true,
            ..WrapperCaps::default()
        }
    }

    async fn extract(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.status != PipelineStatus::Ready {
            return Err(TaskError::ModelNotLoaded.into());
        }

        let guard = self.encoder.read().await;
        let encoder = guard.as_ref().ok_or(TaskError::ModelNotLoaded)?;
        encoder.encode(texts)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pipeline_starts_unloaded_without_dimension() {
        let task = HfFeatureExtractionTask::new();
        assert_eq!(task.status(), PipelineStatus::Unloaded);
        assert!(task.dimension().is_none());
        assert!(task.caps().feature_extraction);
    }

    #[tokio::test]
    async fn extraction_requires_a_loaded_encoder() {
        let task = HfFeatureExtractionTask::new();
        let err = task.extract(&["hi".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("not loaded"));
    }

    #[tokio::test]
    async fn loading_a_bad_directory_marks_the_pipeline_errored() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = HfFeatureExtractionTask::new().normalize(false);
        assert!(task.load(dir.path()).await.is_err());
        assert_eq!(task.status(), PipelineStatus::Error);
    }
}
