use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::ModelInfo;

/// Persistent index of downloaded models, stored as a JSON file.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelInfo>,
    #[serde(skip)]
    registry_path: PathBuf,
}

impl ModelRegistry {
    pub fn load() -> Result<Self> {
        let base_dir = Config::base_dir()?;
        fs::create_dir_all(&base_dir)?;

        Self::load_from(Config::registry_path()?)
    }

    /// Load a registry from an explicit file path.
    pub fn load_from(registry_path: impl AsRef<Path>) -> Result<Self> {
        let registry_path = registry_path.as_ref().to_path_buf();

        let mut registry = if registry_path.exists() {
            let content = fs::read_to_string(&registry_path)?;
            serde_json::from_str(&content)?
        } else {
            ModelRegistry::default()
        };

        registry.registry_path = registry_path;
        Ok(registry)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(&self.registry_path, content)?;
        Ok(())
    }

    pub fn add(&mut self, model: ModelInfo) -> Result<()> {
        self.models.insert(model.name.clone(), model);
        self.save()?;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<ModelInfo>> {
        let removed = self.models.remove(name);
        self.save()?;
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Option<&ModelInfo> {
        self.models.get(name)
    }

    pub fn list(&self) -> Vec<&ModelInfo> {
        self.models.values().collect()
    }

    /// Get the models directory: ~/.config/llmwrap/models/
    pub fn models_dir() -> Result<PathBuf> {
        let dir = Config::load()?.models_dir();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelKind, ModelSource};

    fn sample_model(name: &str) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            source: ModelSource::HuggingFace {
                repo_id: format!("org/{}", name),
            },
            kind: ModelKind::TextGeneration,
            path: PathBuf::from("/tmp/models").join(name),
            size_bytes: 42,
            files: vec!["model.safetensors".to_string()],
            downloaded_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn add_get_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut registry = ModelRegistry::load_from(&path).unwrap();
        registry.add(sample_model("tiny")).unwrap();

        assert!(registry.get("tiny").is_some());
        assert_eq!(registry.list().len(), 1);

        let removed = registry.remove("tiny").unwrap();
        assert!(removed.is_some());
        assert!(registry.get("tiny").is_none());
    }

    #[test]
    fn registry_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        {
            let mut registry = ModelRegistry::load_from(&path).unwrap();
            registry.add(sample_model("persisted")).unwrap();
        }

        let reloaded = ModelRegistry::load_from(&path).unwrap();
        let model = reloaded.get("persisted").expect("model survives reload");
        assert_eq!(model.size_bytes, 42);
        assert_eq!(model.kind, ModelKind::TextGeneration);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::load_from(dir.path().join("nope.json")).unwrap();
        assert!(registry.list().is_empty());
    }
}
