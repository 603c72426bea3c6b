pub mod gemini;
pub mod lines;
pub mod mock;
pub mod ollama;
pub mod openrouter;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use reqwest::Response;

use codedoc_config::ProviderConfig;
use codedoc_core::{CodedocError, LlmProvider};

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openrouter::OpenRouterProvider;

/// Registry of LLM providers, looked up by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Build the registry for the configured endpoints.
    ///
    /// Hosted providers are registered even without a key; requests then fail
    /// upstream instead of at start-up.
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut registry = Self::new();

        let mut gemini = GeminiProvider::new(config.gemini_api_key.clone().unwrap_or_default());
        if let Some(url) = &config.gemini_base_url {
            gemini = gemini.with_base_url(url.clone());
        }
        registry.register("gemini", Arc::new(gemini));

        registry.register(
            "openrouter",
            Arc::new(OpenRouterProvider::new(
                config.openrouter_api_key.clone().unwrap_or_default(),
            )),
        );

        let mut ollama = OllamaProvider::new();
        if let Some(url) = &config.ollama_url {
            ollama = ollama.with_base_url(url.clone());
        }
        registry.register("ollama", Arc::new(ollama));

        registry.register(
            "mock",
            Arc::new(MockProvider::new("mock").with_response("Mock response")),
        );
        registry
    }

    /// Register a provider by name.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Look up a single provider.
    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Get all registered provider names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pass a successful response through; anything else becomes a provider
/// error carrying the status and the upstream body.
pub(crate) async fn check_status(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_body = response.text().await.unwrap_or_default();
    Err(CodedocError::Provider {
        provider: provider.to_string(),
        message: format!("returned {status}: {error_body}"),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codedoc_core::LlmRequest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every request with `status` and `body`.
    async fn canned_server(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(reply.as_bytes()).await;
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_registry_get() {
        let mut registry = ProviderRegistry::new();
        registry.register("mock1", Arc::new(MockProvider::new("mock1")));

        assert_eq!(registry.get("mock1").unwrap().name(), "mock1");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_from_config_registers_all_backends() {
        let registry = ProviderRegistry::from_config(&ProviderConfig::default());
        assert_eq!(registry.list(), vec!["gemini", "mock", "ollama", "openrouter"]);
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let base = canned_server("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let provider = OllamaProvider::new().with_base_url(base);

        let err = provider.complete(&LlmRequest::new("llama3", "hi")).await.unwrap_err();
        match err.downcast_ref::<CodedocError>() {
            Some(CodedocError::Provider { provider, message }) => {
                assert_eq!(provider, "Ollama");
                assert!(message.contains("401"));
                assert!(message.contains("bad key"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }
}
