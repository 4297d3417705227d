//! llmwrap_openai - OpenAI wrapper
//!
//! Chat-completion and embedding clients for the OpenAI API.

pub mod chat;
pub mod embedding;

pub use chat::OpenAiChatModel;
pub use embedding::OpenAiEmbeddingModel;

use llmwrap_core::Config;
use llmwrap_wrapper_api::TaskError;

/// Resolve the API key: explicit argument, then OPENAI_API_KEY, then
/// the config file.
fn resolve_api_key(api_key: Option<String>) -> Result<String, TaskError> {
    api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .or_else(|| Config::load().ok().and_then(|c| c.openai.api_key))
        .ok_or_else(|| TaskError::Auth("OPENAI_API_KEY is not set".to_string()))
}

fn resolve_base_url() -> String {
    Config::load()
        .map(|c| c.openai.base_url)
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_key_wins() {
        let key = resolve_api_key(Some("sk-explicit".to_string())).unwrap();
        assert_eq!(key, "sk-explicit");
    }
}
