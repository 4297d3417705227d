use anyhow::Result;
use llmwrap::{FeatureExtractionTask, HfApiFeatureExtractionTask, HfFeatureExtractionTask};
use llmwrap_core::{Config, ModelRegistry};

pub async fn execute(model: &str, texts: &[String], api: bool) -> Result<()> {
    let embeddings = if api {
        let token = Config::load()?.models.hf_token;
        let task = HfApiFeatureExtractionTask::new(model, token);
        task.extract(texts).await?
    } else {
        let registry = ModelRegistry::load()?;
        let info = registry.get(model).ok_or_else(|| {
            anyhow::anyhow!(
                "Model '{}' not found in registry. Run `llmwrap pull` first",
                model
            )
        })?;

        let mut task = HfFeatureExtractionTask::new();
        task.load(&info.path).await?;
        task.extract(texts).await?
    };

    if let Some(dim) = embeddings.first().map(|e| e.len()) {
        eprintln!("{} embedding(s), dimension {}", embeddings.len(), dim);
    }
    println!("{}", serde_json::to_string(&embeddings)?);

    Ok(())
}
