use anyhow::Result;
use async_trait::async_trait;
use llmwrap_wrapper_api::{
    GenerationChunk, GenerationRequest, GenerationResponse, PipelineStatus, TaskError,
    TextGenerationTask, WrapperCaps,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::model::GenerationModel;
use super::select_device;

/// Local text-generation pipeline running on candle.
pub struct HfTextGenerationTask {
    status: PipelineStatus,
    model: Arc<RwLock<Option<GenerationModel>>>,
}

impl HfTextGenerationTask {
    pub fn new() -> Self {
        Self {
            status: PipelineStatus::Unloaded,
            model: Arc::new(RwLock::new(None)),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Load model weights from a local directory (as laid out by the
    /// hub downloader).
    pub async fn load(&mut self, model_dir: impl AsRef<Path>) -> Result<()> {
        self.status = PipelineStatus::Loading;
        let model_dir = model_dir.as_ref().to_path_buf();
        tracing::info!("Loading text-generation pipeline from {:?}", model_dir);

        let device = select_device()?;
        let loaded =
            tokio::task::spawn_blocking(move || GenerationModel::load(&model_dir, &device)).await?;

        let loaded = match loaded {
            Ok(model) => model,
            Err(e) => {
                self.status = PipelineStatus::Error;
                return Err(e);
            }
        };

        *self.model.write().await = Some(loaded);
        self.status = PipelineStatus::Ready;

        tracing::info!("Pipeline ready");
        Ok(())
    }

    pub async fn unload(&mut self) -> Result<()> {
        tracing::info!("Unloading text-generation pipeline");
        *self.model.write().await = None;
        self.status = PipelineStatus::Unloaded;
        Ok(())
    }
}

impl Default for HfTextGenerationTask {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerationTask for HfTextGenerationTask {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            text_generation: true,
            streaming: true,
            ..WrapperCaps::default()
        }
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        if self.status != PipelineStatus::Ready {
            return Err(TaskError::ModelNotLoaded.into());
        }

        let guard = self.model.read().await;
        let model = guard.as_ref().ok_or(TaskError::ModelNotLoaded)?;

        let outcome = model.generate(&request)?;
        Ok(GenerationResponse {
            text: outcome.text,
            tokens_generated: outcome.tokens_generated as u32,
            finish_reason: outcome.finish_reason,
        })
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<GenerationChunk>> {
        if self.status != PipelineStatus::Ready {
            return Err(TaskError::ModelNotLoaded.into());
        }

        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let model = self.model.clone();

        tokio::spawn(async move {
            let guard = model.read().await;
            if let Some(loaded) = guard.as_ref() {
                if let Err(e) = loaded.generate_stream(&request, tx).await {
                    tracing::error!("Generation error: {}", e);
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pipeline_starts_unloaded() {
        let task = HfTextGenerationTask::new();
        assert_eq!(task.status(), PipelineStatus::Unloaded);
        assert!(task.caps().text_generation);
        assert!(task.caps().streaming);
    }

    #[tokio::test]
    async fn generation_requires_a_loaded_model() {
        let task = HfTextGenerationTask::new();
        let err = task
            .generate(GenerationRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not loaded"));
    }

    #[tokio::test]
    async fn loading_a_bad_directory_marks_the_pipeline_errored() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = HfTextGenerationTask::new();
        assert!(task.load(dir.path()).await.is_err());
        assert_eq!(task.status(), PipelineStatus::Error);
    }
}
