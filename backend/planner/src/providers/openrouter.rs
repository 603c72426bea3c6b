use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use codedoc_core::{LlmProvider, LlmRequest, LlmResponse, TextStream};

use super::check_status;
use super::lines::{decode_lines, sse_data, LineEvent};

/// OpenRouter.ai LLM provider.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn body(request: &LlmRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user_prompt.clone(),
        });

        ChatRequest {
            model: request.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest) -> Result<Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .context("OpenRouter HTTP request failed")?;

        check_status("OpenRouter", response).await
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Parse one line of an OpenAI-style SSE completion stream.
fn parse_sse_line(line: &str) -> Result<LineEvent> {
    let Some(data) = sse_data(line) else {
        // ": OPENROUTER PROCESSING" keep-alives and other fields.
        return Ok(LineEvent::Skip);
    };
    if data == "[DONE]" {
        return Ok(LineEvent::End(None));
    }
    let chunk: StreamChunk =
        serde_json::from_str(data).context("Failed to parse OpenRouter stream chunk")?;
    let text = chunk
        .choices
        .first()
        .and_then(|c| c.delta.as_ref())
        .and_then(|d| d.content.clone())
        .unwrap_or_default();
    Ok(LineEvent::Text(text))
}

#[async_trait]
impl LlmProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();

        debug!(
            model = %request.model,
            "Sending request to OpenRouter"
        );

        let chat_response: ChatResponse = self
            .post(&Self::body(request, false))
            .await?
            .json()
            .await
            .context("Failed to parse OpenRouter response")?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let tokens_used = chat_response
            .usage
            .and_then(|u| u.total_tokens)
            .unwrap_or(0);

        Ok(LlmResponse {
            content,
            provider: "openrouter".to_string(),
            model: request.model.clone(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> Result<TextStream> {
        debug!(model = %request.model, "Opening OpenRouter stream");
        let response = self.post(&Self::body(request, true)).await?;
        Ok(decode_lines(response.bytes_stream().boxed(), parse_sse_line))
    }
}
