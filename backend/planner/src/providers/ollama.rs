use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use codedoc_core::{LlmProvider, LlmRequest, LlmResponse, TextStream};

use super::check_status;
use super::lines::{decode_lines, LineEvent};

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn body(request: &LlmRequest, stream: bool) -> OllamaChatRequest {
        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(OllamaChatMessage {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            });
        }
        messages.push(OllamaChatMessage {
            role: "user".to_string(),
            content: request.user_prompt.clone(),
        });

        OllamaChatRequest {
            model: local_model_name(&request.model),
            messages,
            stream,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    async fn post(&self, body: &OllamaChatRequest) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(body)
            .send()
            .await
            .context("Ollama HTTP request failed")?;

        check_status("Ollama", response).await
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip any provider prefix like "openai/".
fn local_model_name(model: &str) -> String {
    model.rsplit('/').next().unwrap_or(model).to_string()
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize, Deserialize, Default)]
struct OllamaChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: OllamaChatMessage,
    #[serde(default)]
    done: bool,
    error: Option<String>,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

/// Parse one NDJSON line of a streaming `/api/chat` body.
fn parse_ndjson_line(line: &str) -> Result<LineEvent> {
    let chunk: OllamaChatResponse =
        serde_json::from_str(line).context("Failed to parse Ollama stream chunk")?;
    if let Some(error) = chunk.error {
        anyhow::bail!("Ollama stream error: {}", error);
    }
    if chunk.done {
        return Ok(LineEvent::End(Some(chunk.message.content)));
    }
    Ok(LineEvent::Text(chunk.message.content))
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = Self::body(request, false);

        debug!(model = %body.model, "Sending request to Ollama");

        let chat_response: OllamaChatResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        if let Some(error) = chat_response.error {
            anyhow::bail!("Ollama error: {}", error);
        }

        let tokens_used = chat_response.eval_count.unwrap_or(0)
            + chat_response.prompt_eval_count.unwrap_or(0);

        Ok(LlmResponse {
            content: chat_response.message.content,
            provider: "ollama".to_string(),
            model: body.model,
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> Result<TextStream> {
        let body = Self::body(request, true);
        debug!(model = %body.model, "Opening Ollama stream");
        let response = self.post(&body).await?;
        Ok(decode_lines(response.bytes_stream().boxed(), parse_ndjson_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_prefix_stripped() {
        assert_eq!(local_model_name("meta/llama3"), "llama3");
        assert_eq!(local_model_name("llama3"), "llama3");
    }

    #[test]
    fn test_parse_ndjson_lines() {
        let chunk = r#"{"model":"llama3","message":{"role":"assistant","content":"Hi"},"done":false}"#;
        assert_eq!(parse_ndjson_line(chunk).unwrap(), LineEvent::Text("Hi".into()));

        let last = r#"{"model":"llama3","message":{"role":"assistant","content":""},"done":true,"eval_count":5}"#;
        assert_eq!(parse_ndjson_line(last).unwrap(), LineEvent::End(Some(String::new())));
    }

    #[test]
    fn test_parse_ndjson_error() {
        assert!(parse_ndjson_line(r#"{"error":"model not found"}"#).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let provider = OllamaProvider::new().with_base_url("http://gpu-box:11434/");
        assert_eq!(provider.base_url, "http://gpu-box:11434");
    }
}
