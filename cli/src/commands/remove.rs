use anyhow::Result;
use llmwrap_core::ModelRegistry;

pub async fn execute(model: &str) -> Result<()> {
    let mut registry = ModelRegistry::load()?;

    let Some(removed) = registry.remove(model)? else {
        println!("Model '{}' is not installed.", model);
        return Ok(());
    };

    if removed.path.exists() {
        std::fs::remove_dir_all(&removed.path)?;
    }

    println!("Removed {}", removed.name);
    Ok(())
}
