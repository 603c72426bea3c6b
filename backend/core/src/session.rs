//! In-memory chat session.
//!
//! Holds the ordered message list of one chat view. While a reply is
//! streaming, exactly one assistant message is extended in place; every other
//! message is immutable once appended.

use crate::types::{ChatMessage, ChatRole, ChatTurn};

/// Reply shown when a request fails before or during streaming.
pub const STREAM_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request.";

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    /// Index of the assistant message currently being streamed into.
    streaming: Option<usize>,
    /// Cumulative text received for the active stream.
    buffer: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Conversation so far, in wire form.
    pub fn history(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(ChatMessage::to_turn).collect()
    }

    /// Append the user's message and reset the stream state for the reply.
    pub fn push_user(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.finish_stream();
        self.messages.push(ChatMessage::user(content));
        &self.messages[self.messages.len() - 1]
    }

    /// Feed one decoded read from the response body.
    ///
    /// The first non-empty chunk creates the assistant message; later chunks
    /// replace its content with the cumulative buffer.
    pub fn append_chunk(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        self.buffer.push_str(chunk);
        match self.streaming {
            Some(idx) => self.messages[idx].content = self.buffer.clone(),
            None => {
                self.messages.push(ChatMessage::assistant(self.buffer.clone()));
                self.streaming = Some(self.messages.len() - 1);
            }
        }
    }

    /// The assistant message currently being extended, if any.
    pub fn streaming_message(&self) -> Option<&ChatMessage> {
        self.streaming.map(|idx| &self.messages[idx])
    }

    /// Close the active stream; the streamed message becomes immutable.
    pub fn finish_stream(&mut self) {
        self.streaming = None;
        self.buffer.clear();
    }

    /// Close the active stream and append a synthetic assistant error message.
    pub fn push_error(&mut self, content: impl Into<String>) {
        self.finish_stream();
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn assistant_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_extend_single_assistant_message() {
        let mut session = ChatSession::new();
        session.push_user("greet me");
        for chunk in ["Hel", "lo, ", "world"] {
            session.append_chunk(chunk);
        }
        session.finish_stream();

        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.assistant_count(), 1);
        assert_eq!(session.messages()[1].content, "Hello, world");
    }

    #[test]
    fn test_empty_chunk_does_not_create_message() {
        let mut session = ChatSession::new();
        session.push_user("hi");
        session.append_chunk("");
        assert!(session.streaming_message().is_none());
        assert_eq!(session.assistant_count(), 0);
    }

    #[test]
    fn test_message_id_is_stable_while_streaming() {
        let mut session = ChatSession::new();
        session.push_user("hi");
        session.append_chunk("a");
        let id = session.streaming_message().unwrap().id;
        session.append_chunk("b");
        assert_eq!(session.streaming_message().unwrap().id, id);
        assert_eq!(session.streaming_message().unwrap().content, "ab");
    }

    #[test]
    fn test_next_reply_starts_new_message() {
        let mut session = ChatSession::new();
        session.push_user("one");
        session.append_chunk("first");
        session.push_user("two");
        session.append_chunk("second");
        session.finish_stream();

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "first", "two", "second"]);
    }

    #[test]
    fn test_error_before_any_chunk() {
        let mut session = ChatSession::new();
        session.push_user("hi");
        session.push_error(STREAM_ERROR_MESSAGE);
        assert_eq!(session.assistant_count(), 1);
        assert_eq!(session.messages()[1].content, STREAM_ERROR_MESSAGE);
        assert!(session.streaming_message().is_none());
    }

    #[test]
    fn test_history_is_wire_form() {
        let mut session = ChatSession::new();
        session.push_user("q");
        session.append_chunk("a");
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].content, "a");
    }
}
