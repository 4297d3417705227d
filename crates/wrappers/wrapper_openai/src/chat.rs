use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use llmwrap_wrapper_api::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, GenerationChunk, TaskError, WrapperCaps,
};
use serde::{Deserialize, Serialize};

use crate::{resolve_api_key, resolve_base_url};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatChoiceDelta>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceDelta {
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion client for the OpenAI API.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(model: &str, api_key: Option<String>) -> Result<Self> {
        let api_key = resolve_api_key(api_key)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: resolve_base_url(),
            model: model.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post_completions(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::Response, TaskError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TaskError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn caps(&self) -> WrapperCaps {
        WrapperCaps {
            chat: true,
            streaming: true,
            ..WrapperCaps::default()
        }
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let response = self.post_completions(&request, false).await?;
        let completion: ChatCompletionResponse = response.json().await.map_err(TaskError::Http)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::UnexpectedResponse("no choices in response".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            TaskError::UnexpectedResponse("no content in chat response".to_string())
        })?;

        Ok(ChatResponse {
            content: content.trim().to_string(),
            tokens_used: completion.usage.map(|u| u.completion_tokens).unwrap_or(0),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        })
    }

    async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<GenerationChunk>> {
        let response = self.post_completions(&request, true).await?;

        let (tx, rx) = tokio::sync::mpsc::channel(100);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::error!("Stream error: {}", e);
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // SSE events are newline-delimited `data:` lines
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=pos);

                    let Some(data) = sse_data(&line) else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }

                    let parsed: ChatCompletionChunk = match serde_json::from_str(data) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            tracing::warn!("Skipping malformed SSE chunk: {}", e);
                            continue;
                        }
                    };

                    for choice in parsed.choices {
                        let chunk = GenerationChunk {
                            content: choice.delta.content.unwrap_or_default(),
                            finish_reason: choice.finish_reason,
                        };
                        if tx.send(chunk).await.is_err() {
                            // Receiver dropped
                            return;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Payload of an SSE `data:` line, if the line is one.
fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_data_lines_are_recognized() {
        assert_eq!(sse_data("data: {\"x\":1}"), Some("{\"x\":1}"));
        assert_eq!(sse_data("data:[DONE]"), Some("[DONE]"));
        assert_eq!(sse_data(": keep-alive"), None);
        assert_eq!(sse_data(""), None);
    }

    #[test]
    fn completion_response_parses_content_and_usage() {
        let body = r#"{
            "choices": [{
                "message": {"role": "assistant", "content": "hello there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;
        let completion: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            completion.choices[0].message.content.as_deref(),
            Some("hello there")
        );
        assert_eq!(completion.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn stream_chunk_parses_delta_content() {
        let body = r#"{"choices": [{"delta": {"content": "hel"}, "finish_reason": null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(body).unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hel"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn request_body_matches_the_wire_format() {
        let messages = vec![ChatMessage::new("user", "hi")];
        let request = ChatRequest {
            messages,
            max_tokens: 128,
            temperature: 0.2,
            stream: false,
        };
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 128);
        assert_eq!(value["stream"], true);
    }
}
