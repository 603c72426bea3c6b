//! Line-delimited streaming bodies (SSE `data:` lines, NDJSON).
//!
//! HTTP chunks do not respect line boundaries, so bytes are buffered until a
//! newline arrives and each complete line is handed to a provider-specific
//! parser.

use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};

use codedoc_core::TextStream;

/// What a parsed line contributes to the text stream.
#[derive(Debug, PartialEq)]
pub enum LineEvent {
    /// A text fragment.
    Text(String),
    /// Keep-alives, comments, metadata.
    Skip,
    /// The provider signalled the end of generation, optionally with a last fragment.
    End(Option<String>),
}

type ByteStream = BoxStream<'static, reqwest::Result<Bytes>>;

struct LineState<F> {
    bytes: ByteStream,
    buf: Vec<u8>,
    pending: VecDeque<Result<String>>,
    done: bool,
    parse: F,
}

impl<F> LineState<F>
where
    F: FnMut(&str) -> Result<LineEvent>,
{
    fn drain_lines(&mut self, at_eof: bool) {
        while !self.done {
            let line = match self.buf.iter().position(|b| *b == b'\n') {
                Some(pos) => self.buf.drain(..=pos).collect::<Vec<u8>>(),
                None if at_eof && !self.buf.is_empty() => std::mem::take(&mut self.buf),
                None => break,
            };
            self.handle_line(&line);
        }
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return;
        }
        match (self.parse)(line) {
            Ok(LineEvent::Text(fragment)) => {
                if !fragment.is_empty() {
                    self.pending.push_back(Ok(fragment));
                }
            }
            Ok(LineEvent::Skip) => {}
            Ok(LineEvent::End(last)) => {
                if let Some(fragment) = last.filter(|f| !f.is_empty()) {
                    self.pending.push_back(Ok(fragment));
                }
                self.finish();
            }
            Err(e) => {
                self.pending.push_back(Err(e));
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        self.buf.clear();
    }
}

/// Turn a streaming response body into text fragments using `parse` per line.
pub fn decode_lines<F>(bytes: ByteStream, parse: F) -> TextStream
where
    F: FnMut(&str) -> Result<LineEvent> + Send + 'static,
{
    let state = LineState {
        bytes,
        buf: Vec::new(),
        pending: VecDeque::new(),
        done: false,
        parse,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    st.buf.extend_from_slice(&chunk);
                    st.drain_lines(false);
                }
                Some(Err(e)) => {
                    st.pending
                        .push_back(Err(anyhow!(e).context("Response stream read failed")));
                    st.finish();
                }
                None => {
                    st.drain_lines(true);
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}

/// Payload of an SSE `data:` line, if this is one.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}
