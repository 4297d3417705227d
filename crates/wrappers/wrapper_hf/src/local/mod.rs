//! Local pipeline equivalents of the HuggingFace tasks, running on
//! candle. Supports Metal (macOS) and CUDA (Linux/Windows) acceleration.

mod embedder;
mod model;
mod sampling;

pub mod feature_extraction;
pub mod text_generation;

pub use feature_extraction::HfFeatureExtractionTask;
pub use text_generation::HfTextGenerationTask;

use anyhow::Result;
use candle_core::{DType, Device};
use std::path::{Path, PathBuf};

pub(crate) fn select_device() -> Result<Device> {
    #[cfg(feature = "metal")]
    {
        tracing::info!("Using Metal device");
        Ok(Device::new_metal(0)?)
    }
    #[cfg(feature = "cuda")]
    {
        tracing::info!("Using CUDA device");
        Ok(Device::new_cuda(0)?)
    }
    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    {
        tracing::info!("Using CPU device (no GPU features enabled)");
        Ok(Device::Cpu)
    }
}

pub(crate) fn dtype_for(device: &Device) -> DType {
    match device {
        // CUDA can use BF16; Metal and CPU work best with F32
        Device::Cuda(_) => DType::BF16,
        _ => DType::F32,
    }
}

pub(crate) fn find_file(model_dir: &Path, filename: &str) -> Result<PathBuf> {
    let direct = model_dir.join(filename);
    if direct.exists() {
        return Ok(direct);
    }

    // Search in subdirectories
    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.file_name().map(|n| n == filename).unwrap_or(false) {
            return Ok(path);
        }
    }

    anyhow::bail!("Could not find {} in {:?}", filename, model_dir)
}

/// Every safetensors shard in the model directory, sorted so sharded
/// checkpoints load in order.
pub(crate) fn find_weights(model_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut weights = Vec::new();
    for entry in std::fs::read_dir(model_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path
            .extension()
            .map(|e| e == "safetensors")
            .unwrap_or(false)
        {
            weights.push(path);
        }
    }
    weights.sort();

    if weights.is_empty() {
        anyhow::bail!(
            "Could not find model weights (safetensors) in {:?}",
            model_dir
        );
    }

    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn find_file_checks_direct_path_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();

        let found = find_file(dir.path(), "config.json").unwrap();
        assert_eq!(found, dir.path().join("config.json"));
    }

    #[test]
    fn find_file_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_file(dir.path(), "tokenizer.json").is_err());
    }

    #[test]
    fn find_weights_returns_sorted_shards() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("model-00002-of-00002.safetensors"), "b").unwrap();
        fs::write(dir.path().join("model-00001-of-00002.safetensors"), "a").unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();

        let weights = find_weights(dir.path()).unwrap();
        assert_eq!(weights.len(), 2);
        assert!(weights[0].to_string_lossy().contains("00001"));
    }

    #[test]
    fn find_weights_requires_safetensors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pytorch_model.bin"), "x").unwrap();
        assert!(find_weights(dir.path()).is_err());
    }
}
