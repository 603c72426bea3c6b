use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};

/// Incremental text fragments produced by a streaming generation call.
///
/// Fragments arrive in the order the model produced them. An `Err` item ends
/// the stream.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for the AI model backends CodeDoc talks to.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and return the full response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;

    /// Open a streaming generation call.
    ///
    /// The outer `Result` covers everything up to the first fragment (connect,
    /// authentication, HTTP status). Failures after that point are reported as
    /// an `Err` item on the stream.
    ///
    /// Providers without a native streaming API fall back to a single fragment
    /// holding the complete response.
    async fn stream(&self, request: &LlmRequest) -> Result<TextStream> {
        let response = self.complete(request).await?;
        Ok(stream::once(async move { Ok(response.content) }).boxed())
    }
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: String::new(),
            user_prompt: user_prompt.into(),
            max_tokens: 8192,
            temperature: 0.7,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: format!("echo: {}", request.user_prompt),
                provider: "fixed".into(),
                model: request.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_default_stream_yields_single_fragment() {
        let provider = FixedProvider;
        let request = LlmRequest::new("m", "hi");
        let fragments: Vec<String> = provider
            .stream(&request)
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["echo: hi".to_string()]);
    }

    #[test]
    fn test_request_builder() {
        let req = LlmRequest::new("gemini-2.0-flash", "prompt").with_system_prompt("sys");
        assert_eq!(req.system_prompt, "sys");
        assert_eq!(req.user_prompt, "prompt");
        assert_eq!(req.max_tokens, 8192);
    }
}
