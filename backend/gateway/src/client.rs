//! Client side of the chat relay.
//!
//! Posts a prompt to `/generalquery` and feeds each decoded read of the
//! chunked body into a [`ChatSession`], so the caller can redraw after every
//! fragment.

use futures::StreamExt;
use serde_json::json;
use tracing::{debug, warn};

use codedoc_core::ChatSession;
use codedoc_core::session::STREAM_ERROR_MESSAGE;

/// Incremental UTF-8 decoder.
///
/// Reads can split a multi-byte sequence; the incomplete tail is held back
/// until the next read completes it. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        let mut start = 0;

        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Truncated sequence at the end: wait for more bytes.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush whatever is left once the body has ended.
    pub fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The body ended normally.
    Completed { bytes: usize },
    /// The request failed; the session holds the error message.
    Failed,
}

pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send `prompt` with the session's history and stream the reply into it.
    ///
    /// `on_chunk` runs after every read that changed the session. On any
    /// failure the session gets exactly one error message.
    pub async fn send(
        &self,
        session: &mut ChatSession,
        prompt: &str,
        mut on_chunk: impl FnMut(&ChatSession),
    ) -> RelayOutcome {
        let history = session.history();
        session.push_user(prompt);

        let response = self
            .client
            .post(format!("{}/generalquery", self.base_url))
            .json(&json!({ "messages": history, "userPrompt": prompt }))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(status = %r.status(), "Chat request rejected");
                session.push_error(STREAM_ERROR_MESSAGE);
                return RelayOutcome::Failed;
            }
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                session.push_error(STREAM_ERROR_MESSAGE);
                return RelayOutcome::Failed;
            }
        };

        let mut decoder = Utf8Decoder::new();
        let mut bytes = 0usize;
        let mut body = response.bytes_stream();
        while let Some(read) = body.next().await {
            match read {
                Ok(chunk) => {
                    bytes += chunk.len();
                    let text = decoder.decode(&chunk);
                    if !text.is_empty() {
                        session.append_chunk(&text);
                        on_chunk(session);
                    }
                }
                Err(e) => {
                    warn!(error = %e, bytes, "Chat stream interrupted");
                    session.push_error(STREAM_ERROR_MESSAGE);
                    return RelayOutcome::Failed;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            session.append_chunk(&tail);
            on_chunk(session);
        }
        session.finish_stream();
        debug!(bytes, "Chat stream completed");
        RelayOutcome::Completed { bytes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mock_state, spawn_app};
    use codedoc_planner::providers::MockProvider;
    use std::time::Duration;

    #[test]
    fn test_decoder_joins_split_sequence() {
        let bytes = "héllo".as_bytes();
        let mut decoder = Utf8Decoder::new();
        // 'é' is two bytes; split between them.
        assert_eq!(decoder.decode(&bytes[..2]), "h");
        assert_eq!(decoder.decode(&bytes[2..]), "éllo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_byte_at_a_time() {
        let text = "日本語 ok 🚀";
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for b in text.as_bytes() {
            out.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, text);
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_decoder_flushes_truncated_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE6]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_reply() {
        let provider = MockProvider::new("mock")
            .with_chunks(["partial", "never"])
            .with_chunk_delay(Duration::from_millis(50))
            .fail_after(1);
        let base = spawn_app(mock_state(provider)).await;

        let mut session = ChatSession::new();
        let outcome = RelayClient::new(&base).send(&mut session, "hi", |_| {}).await;

        assert_eq!(outcome, RelayOutcome::Failed);
        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "partial", STREAM_ERROR_MESSAGE]);
        assert_eq!(session.assistant_count(), 2);
        assert!(session.streaming_message().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_gives_error_message() {
        let client = RelayClient::new("http://127.0.0.1:1");
        let mut session = ChatSession::new();
        let outcome = client.send(&mut session, "hi", |_| {}).await;

        assert_eq!(outcome, RelayOutcome::Failed);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1].content, STREAM_ERROR_MESSAGE);
    }
}
