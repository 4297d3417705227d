use anyhow::Result;
use llmwrap::{
    GenerationRequest, HfApiTextGenerationTask, HfTextGenerationTask, TextGenerationTask,
};
use llmwrap_core::{Config, ModelRegistry};
use std::io::Write;

pub async fn execute(
    model: &str,
    prompt: &str,
    api: bool,
    max_new_tokens: Option<u32>,
    temperature: Option<f32>,
) -> Result<()> {
    let config = Config::load()?;

    let mut request = GenerationRequest::new(prompt);
    request.max_new_tokens = max_new_tokens.unwrap_or(config.inference.max_tokens);
    request.temperature = temperature.unwrap_or(config.inference.temperature);
    request.top_p = config.inference.top_p;

    if api {
        let task = HfApiTextGenerationTask::new(model, config.models.hf_token);
        let response = task.generate(request).await?;
        println!("{}", response.text);
        return Ok(());
    }

    let registry = ModelRegistry::load()?;
    let info = registry.get(model).ok_or_else(|| {
        anyhow::anyhow!(
            "Model '{}' not found in registry. Run `llmwrap pull` first",
            model
        )
    })?;

    let mut task = HfTextGenerationTask::new();
    task.load(&info.path).await?;

    // Stream tokens to the terminal as they come
    let mut rx = task.generate_stream(request).await?;
    let mut stdout = std::io::stdout();
    while let Some(chunk) = rx.recv().await {
        print!("{}", chunk.content);
        stdout.flush()?;
        if chunk.finish_reason.is_some() {
            break;
        }
    }
    println!();

    Ok(())
}
