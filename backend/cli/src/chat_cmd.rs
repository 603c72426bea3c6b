//! `codedoc chat`: interactive chat against a running server.
//!
//! Each line read from stdin is one prompt. The reply is printed as it
//! streams in; the session keeps the history for the next prompt.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use codedoc_core::ChatSession;
use codedoc_gateway::{RelayClient, RelayOutcome};

use crate::terminal_output::{note_error, note_info, stream_write, BOLD, DIM, RESET};

pub async fn run(base_url: &str) -> Result<()> {
    let client = RelayClient::new(base_url);
    let mut session = ChatSession::new();
    note_info(&format!("Chatting with {base_url}. Empty line or Ctrl-D to quit."));

    let stdin = io::stdin();
    loop {
        print!("{BOLD}you>{RESET} ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            break;
        }

        let mut printer = DeltaPrinter::default();
        let mut stdout = io::stdout();
        let outcome = client
            .send(&mut session, prompt, |s| {
                if let Some(message) = s.streaming_message() {
                    let _ = printer.print(&mut stdout, &message.content);
                }
            })
            .await;

        match outcome {
            RelayOutcome::Completed { bytes } => println!("\n{DIM}({bytes} bytes){RESET}"),
            RelayOutcome::Failed => {
                println!();
                if let Some(last) = session.messages().last() {
                    note_error(&last.content);
                }
            }
        }
    }
    Ok(())
}

/// Prints only the part of the cumulative reply not yet on screen.
#[derive(Default)]
struct DeltaPrinter {
    shown: usize,
}

impl DeltaPrinter {
    fn print(&mut self, out: &mut impl Write, content: &str) -> io::Result<()> {
        if let Some(delta) = content.get(self.shown..) {
            stream_write(out, delta)?;
            self.shown = content.len();
        }
        Ok(())
    }
}
