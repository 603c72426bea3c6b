use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use codedoc_core::{LlmProvider, LlmRequest, LlmResponse, TextStream};

/// A mock LLM provider that returns canned responses.
///
/// Every request it receives is recorded so tests can inspect the prompt.
pub struct MockProvider {
    name: String,
    fixed_response: Option<String>,
    chunks: Vec<String>,
    failure: Option<String>,
    fail_after: Option<usize>,
    chunk_delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            chunks: Vec::new(),
            failure: None,
            fail_after: None,
            chunk_delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Fragments yielded by `stream`. `complete` returns them joined.
    pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Every call fails before producing anything.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// The stream yields `n` fragments and then an error.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Sleep before each streamed fragment.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, request: &LlmRequest) -> Result<()> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match &self.failure {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }

    fn content(&self) -> String {
        match &self.fixed_response {
            Some(response) => response.clone(),
            None if !self.chunks.is_empty() => self.chunks.concat(),
            None => "Mock response".to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &LlmRequest) -> Result<LlmResponse> {
        self.record(req)?;
        Ok(LlmResponse {
            content: self.content(),
            provider: self.name.clone(),
            model: "mock".to_string(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }

    async fn stream(&self, req: &LlmRequest) -> Result<TextStream> {
        self.record(req)?;

        let chunks = if self.chunks.is_empty() {
            vec![self.content()]
        } else {
            self.chunks.clone()
        };
        let mut items: Vec<Result<String>> = chunks.into_iter().map(Ok).collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(anyhow::anyhow!("mock stream failed after {n} fragments")));
        }

        let delay = self.chunk_delay;
        Ok(stream::iter(items)
            .then(move |item| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                item
            })
            .boxed())
    }
}
