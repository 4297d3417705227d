use anyhow::Result;
use llmwrap::{EmbeddingModel, OpenAiEmbeddingModel};

pub async fn execute(model: &str, texts: &[String]) -> Result<()> {
    let embedder = OpenAiEmbeddingModel::new(model, None)?;
    let embeddings = embedder.embed(texts).await?;

    if let Some(dim) = embeddings.first().map(|e| e.len()) {
        eprintln!("{} embedding(s), dimension {}", embeddings.len(), dim);
    }
    println!("{}", serde_json::to_string(&embeddings)?);

    Ok(())
}
