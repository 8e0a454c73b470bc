//! Console transport: one local user typing into stdin.
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{InboundMessage, SessionCommand, SessionEvent};

const FENCE: &str = "```";

/// Groups console lines into chat messages.
///
/// A line starting with ``` opens a block that runs up to the closing
/// fence and becomes one message without the fences. Every other line is
/// a message of its own; blank lines outside a block are dropped.
#[derive(Debug, Default)]
pub struct LineAssembler {
    block: Option<Vec<String>>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one line. Returns a message once one is complete.
    pub fn push(&mut self, line: &str) -> Option<String> {
        let fence = line.trim_start().starts_with(FENCE);

        if let Some(lines) = self.block.as_mut() {
            if !fence {
                lines.push(line.to_string());
                return None;
            }
            return self.block.take().map(|lines| lines.join("\n"));
        }

        if fence {
            self.block = Some(Vec::new());
            None
        } else if line.trim().is_empty() {
            None
        } else {
            Some(line.to_string())
        }
    }

    /// Flushes an unterminated block at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.block
            .take()
            .filter(|lines| !lines.is_empty())
            .map(|lines| lines.join("\n"))
    }

    pub fn in_block(&self) -> bool {
        self.block.is_some()
    }
}

/// Spawns the stdin reader. Every message is sent as coming from `user`.
/// The event channel closes when stdin reaches EOF.
pub fn spawn_reader(user: String, event_tx: mpsc::Sender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if event_tx.send(SessionEvent::Connected).await.is_err() {
            return;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut assembler = LineAssembler::new();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    info!("stdin closed: {e}");
                    break;
                }
            };

            if let Some(body) = assembler.push(&line) {
                if !send(&event_tx, &user, body).await {
                    return;
                }
            } else if assembler.in_block() {
                debug!("Gathering fenced block");
            }
        }

        if let Some(body) = assembler.finish() {
            send(&event_tx, &user, body).await;
        }
        info!("Console input finished");
    })
}

async fn send(event_tx: &mpsc::Sender<SessionEvent>, user: &str, body: String) -> bool {
    event_tx
        .send(SessionEvent::Message(InboundMessage {
            from: user.to_string(),
            body,
        }))
        .await
        .is_ok()
}

/// Prints outbound commands until the runtime drops its sender.
pub async fn print_replies(name: String, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SessionCommand::SendMessage { to, body } => {
                println!("\n[{name} → {to}]\n{body}\n");
            }
            SessionCommand::SendVoice { to, text } => {
                println!("[{name} → {to}, voice] {text}\n");
            }
        }
    }
}
