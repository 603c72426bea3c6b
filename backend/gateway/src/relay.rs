//! Chunked stream relay.
//!
//! One request opens one model stream. A producer task moves fragments from
//! the model into a bounded queue; the response body drains the queue, so each
//! fragment reaches the socket as soon as the client can take it. Nothing is
//! shared between requests.

use std::io;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};
use uuid::Uuid;

use codedoc_core::{ChatTurn, TextStream};
use codedoc_logging::{EventLogger, RequestEvent};

use crate::error::ApiError;
use crate::server::GatewayState;

const NO_PROMPT: &str = "Bad request: no prompt was provided.";

#[derive(Debug, Deserialize)]
pub struct GeneralQueryRequest {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(rename = "userPrompt", default)]
    pub user_prompt: Option<String>,
}

type Chunk = Result<String, io::Error>;

/// `POST /generalquery`: stream a chat reply as `text/plain` chunks.
///
/// Failing to open the model stream is a JSON 500. A failure after the first
/// byte aborts the connection without the terminating chunk.
pub async fn general_query(
    State(state): State<GatewayState>,
    body: Result<Json<GeneralQueryRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::BadRequest(NO_PROMPT))?;
    let prompt = request
        .user_prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or(ApiError::BadRequest(NO_PROMPT))?;

    let request_id = Uuid::new_v4().to_string();
    EventLogger::log_event(
        &request_id,
        RequestEvent::PromptDispatched {
            route: "/generalquery".into(),
            provider: state.planner.provider_name().into(),
            prompt_chars: prompt.len(),
        },
    );

    let stream = state
        .planner
        .chat_stream(&request.messages, &prompt)
        .await
        .map_err(|e| {
            EventLogger::log_event(&request_id, RequestEvent::Error { error_msg: format!("{e:#}") });
            ApiError::InternalJson
        })?;

    let relay = &state.config.relay;
    let (tx, rx) = mpsc::channel::<Chunk>(relay.queue_depth.max(1));
    let pacing = (relay.word_delay_ms > 0).then(|| Duration::from_millis(relay.word_delay_ms));
    tokio::spawn(pump(stream, tx, pacing, request_id));

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response())
}

/// Producer side: model stream into the queue, in order, untransformed.
///
/// Stops as soon as the queue is closed, i.e. the client went away.
async fn pump(mut stream: TextStream, tx: mpsc::Sender<Chunk>, pacing: Option<Duration>, request_id: String) {
    let mut fragments = 0usize;
    let mut bytes = 0usize;

    while let Some(item) = stream.next().await {
        let fragment = match item {
            Ok(fragment) => fragment,
            Err(e) => {
                EventLogger::log_event(&request_id, RequestEvent::Error { error_msg: format!("{e:#}") });
                let _ = tx.send(Err(io::Error::other("model stream failed"))).await;
                return;
            }
        };
        fragments += 1;
        bytes += fragment.len();

        let delivered = match pacing {
            None => tx.send(Ok(fragment)).await.is_ok(),
            Some(delay) => send_words(&tx, &fragment, delay).await,
        };
        if !delivered {
            warn!(request_id = %request_id, fragments, "Client disconnected, stopping relay");
            EventLogger::log_event(
                &request_id,
                RequestEvent::RelayFinished { fragments, bytes, client_disconnected: true },
            );
            return;
        }
        debug!(request_id = %request_id, fragments, "Fragment relayed");
    }

    EventLogger::log_event(
        &request_id,
        RequestEvent::RelayFinished { fragments, bytes, client_disconnected: false },
    );
}

/// Paced variant: one word per write. Words keep their trailing space so the
/// concatenated output equals the fragment.
async fn send_words(tx: &mpsc::Sender<Chunk>, fragment: &str, delay: Duration) -> bool {
    for word in fragment.split_inclusive(' ') {
        if tx.send(Ok(word.to_string())).await.is_err() {
            return false;
        }
        tokio::time::sleep(delay).await;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RelayClient;
    use crate::test_support::{mock_state, mock_state_with, spawn_app};
    use codedoc_config::AppConfig;
    use codedoc_core::ChatSession;
    use codedoc_core::session::STREAM_ERROR_MESSAGE;
    use codedoc_planner::providers::MockProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_builds_one_assistant_message() {
        let base = spawn_app(mock_state(MockProvider::new("mock").with_chunks(["Hel", "lo, ", "world"]))).await;

        let client = RelayClient::new(&base);
        let mut session = ChatSession::new();
        let mut seen = Vec::new();
        client
            .send(&mut session, "greet me", |s| {
                seen.push(s.streaming_message().map(|m| m.content.clone()).unwrap_or_default())
            })
            .await;

        assert_eq!(session.assistant_count(), 1);
        assert_eq!(session.messages().last().unwrap().content, "Hello, world");
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[1].starts_with(&w[0])));
    }

    #[tokio::test]
    async fn test_response_is_chunked_plain_text() {
        let base = spawn_app(mock_state(MockProvider::new("mock").with_chunks(["a", "b"]))).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({ "messages": [], "userPrompt": "hi" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["transfer-encoding"], "chunked");
        assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(response.text().await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_history_reaches_the_model() {
        let provider = std::sync::Arc::new(MockProvider::new("mock").with_chunks(["ok"]));
        let planner = codedoc_planner::LlmPlanner::new(
            provider.clone(),
            codedoc_planner::GenerationPolicy::from(&AppConfig::default().provider),
        );
        let base = spawn_app(crate::server::GatewayState::new(AppConfig::default(), planner)).await;

        reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({
                "messages": [{ "role": "user", "content": "my name is Ada" }],
                "userPrompt": "what is my name?"
            }))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let prompt = &provider.requests()[0].user_prompt;
        assert!(prompt.contains("my name is Ada"));
        assert!(prompt.contains("what is my name?"));
    }

    #[tokio::test]
    async fn test_missing_prompt_is_400() {
        let base = spawn_app(mock_state(MockProvider::new("mock"))).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({ "messages": [] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), NO_PROMPT);
    }

    #[tokio::test]
    async fn test_open_failure_is_json_500() {
        let base = spawn_app(mock_state(MockProvider::new("mock").failing("no key"))).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({ "userPrompt": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.json::<serde_json::Value>().await.unwrap(), json!({ "error": "Internal server error." }));
    }

    #[tokio::test]
    async fn test_failure_before_first_byte_gives_one_error_message() {
        let base = spawn_app(mock_state(MockProvider::new("mock").failing("no key"))).await;
        let mut session = ChatSession::new();
        RelayClient::new(&base).send(&mut session, "hi", |_| {}).await;

        assert_eq!(session.assistant_count(), 1);
        assert_eq!(session.messages().last().unwrap().content, STREAM_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_aborts_body() {
        let provider = MockProvider::new("mock").with_chunks(["partial", "never"]).fail_after(1);
        let base = spawn_app(mock_state(provider)).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({ "userPrompt": "hi" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.text().await.is_err());
    }

    #[tokio::test]
    async fn test_paced_relay_preserves_text() {
        let mut config = AppConfig::default();
        config.relay.word_delay_ms = 1;
        let provider = MockProvider::new("mock").with_chunks(["one two ", "three"]);
        let base = spawn_app(mock_state_with(provider, config)).await;

        let text = reqwest::Client::new()
            .post(format!("{base}/generalquery"))
            .json(&json!({ "userPrompt": "count" }))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, "one two three");
    }

    #[tokio::test]
    async fn test_pump_stops_when_client_leaves() {
        let stream: TextStream = futures::stream::iter((0..1000).map(|i| Ok(format!("{i} ")))).boxed();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        // Returns instead of draining all 1000 fragments into a closed queue.
        tokio::time::timeout(Duration::from_secs(1), pump(stream, tx, None, "t".into()))
            .await
            .unwrap();
    }
}
