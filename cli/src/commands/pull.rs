use anyhow::Result;
use llmwrap_core::downloaders::{Downloader, HubDownloader};
use llmwrap_core::{Config, ModelRegistry};

pub async fn execute(model: &str, file: Option<&str>) -> Result<()> {
    println!("Pulling model: {}", model);

    let token = Config::load()?.models.hf_token;
    let downloader = HubDownloader::new(token);
    let model_info = downloader.download(model, file).await?;

    // Register the model
    let mut registry = ModelRegistry::load()?;
    registry.add(model_info.clone())?;

    println!("\nModel downloaded successfully!");
    println!("  Name: {}", model_info.name);
    println!("  Kind: {}", model_info.kind.as_str());
    println!(
        "  Size: {:.2} GB",
        model_info.size_bytes as f64 / 1_073_741_824.0
    );
    println!("  Path: {:?}", model_info.path);

    Ok(())
}
