use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model storage settings
    #[serde(default)]
    pub models: ModelsConfig,

    /// OpenAI credentials and endpoint
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Inference defaults
    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory to store models (default: ~/.config/llmwrap/models/)
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// HuggingFace token for the Inference API and gated repos
    #[serde(default)]
    pub hf_token: Option<String>,
}

fn default_storage_path() -> PathBuf {
    Config::base_dir()
        .map(|p| p.join("models"))
        .unwrap_or_else(|_| PathBuf::from("~/.config/llmwrap/models"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; the OPENAI_API_KEY environment variable takes precedence
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Default max new tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default top-p
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Use GPU acceleration for local pipelines (Metal on macOS, CUDA on Linux)
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_use_gpu() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            openai: OpenAiConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            hf_token: None,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            use_gpu: default_use_gpu(),
        }
    }
}

impl Config {
    /// Get the base directory: ~/.config/llmwrap/
    pub fn base_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("USERPROFILE").map(PathBuf::from))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".config").join("llmwrap"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path: ~/.config/llmwrap/config.toml
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.toml"))
    }

    /// Get the registry file path: ~/.config/llmwrap/registry.json
    pub fn registry_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("registry.json"))
    }

    /// Get the models directory from config
    pub fn models_dir(&self) -> PathBuf {
        self.models.storage_path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.inference.max_tokens, 512);
        assert_eq!(config.inference.temperature, 0.7);
        assert_eq!(config.inference.top_p, 0.9);
        assert!(config.inference.use_gpu);
        assert!(config.models.hf_token.is_none());
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [openai]
            api_key = "sk-test"

            [inference]
            temperature = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.inference.temperature, 0.2);
        assert_eq!(config.inference.max_tokens, 512);
    }

    #[test]
    fn serialized_config_round_trips() {
        let mut config = Config::default();
        config.models.hf_token = Some("hf_abc".to_string());
        config.inference.max_tokens = 64;

        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.models.hf_token.as_deref(), Some("hf_abc"));
        assert_eq!(parsed.inference.max_tokens, 64);
    }
}
