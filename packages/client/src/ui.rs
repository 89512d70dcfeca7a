//! Terminal input and output for the client.

use std::io::Write;

use async_trait::async_trait;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::formatter::MessageFormatter;

/// Outcome of asking the user for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    /// Ctrl+C
    Interrupted,
    /// Ctrl+D, or the input is gone
    Eof,
}

/// Source of user input lines.
///
/// `read_line` must be cancel-safe: if the returned future is dropped before
/// completing, the next call yields the line that was being typed.
#[async_trait]
pub trait LineSource: Send {
    async fn read_line(&mut self, prompt: &str) -> LineEvent;
}

/// Blocking user-facing notification.
#[cfg_attr(test, mockall::automock)]
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert written to stderr, with a terminal bell.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalAlert;

impl Alerter for TerminalAlert {
    fn alert(&self, message: &str) {
        eprint!("\x07{}", MessageFormatter::format_alert(message));
    }
}

/// Line editor running on its own thread (rustyline is synchronous).
///
/// Each `read_line` hands a prompt to the thread and waits for the typed line
/// over a channel.
pub struct LineReader {
    prompts: std::sync::mpsc::Sender<String>,
    lines: mpsc::UnboundedReceiver<LineEvent>,
    /// A prompt was handed over and its line has not been received yet
    waiting: bool,
}

impl LineReader {
    pub fn spawn() -> Self {
        let (prompt_tx, prompt_rx) = std::sync::mpsc::channel::<String>();
        let (line_tx, line_rx) = mpsc::unbounded_channel::<LineEvent>();

        std::thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    tracing::error!("Failed to initialize readline: {}", e);
                    line_tx.send(LineEvent::Eof).ok();
                    return;
                }
            };

            while let Ok(prompt) = prompt_rx.recv() {
                let event = match rl.readline(&prompt) {
                    Ok(line) => {
                        if !line.trim().is_empty() {
                            rl.add_history_entry(line.as_str()).ok();
                        }
                        LineEvent::Line(line)
                    }
                    Err(ReadlineError::Interrupted) => {
                        tracing::info!("Interrupted");
                        LineEvent::Interrupted
                    }
                    Err(ReadlineError::Eof) => {
                        tracing::info!("EOF");
                        LineEvent::Eof
                    }
                    Err(err) => {
                        tracing::error!("Readline error: {}", err);
                        LineEvent::Eof
                    }
                };

                let finished = !matches!(event, LineEvent::Line(_));
                if line_tx.send(event).is_err() || finished {
                    break;
                }
            }
        });

        Self {
            prompts: prompt_tx,
            lines: line_rx,
            waiting: false,
        }
    }
}

#[async_trait]
impl LineSource for LineReader {
    async fn read_line(&mut self, prompt: &str) -> LineEvent {
        if !self.waiting {
            if self.prompts.send(prompt.to_string()).is_err() {
                return LineEvent::Eof;
            }
            self.waiting = true;
        }

        let event = self.lines.recv().await.unwrap_or(LineEvent::Eof);
        self.waiting = false;
        event
    }
}

/// Redisplay the prompt after printing something above it
pub fn redisplay_prompt(out: &mut (dyn Write + Send), prompt: &str) {
    write!(out, "{}", prompt).ok();
    out.flush().ok();
}

/// Line source fed from a channel, recording the prompts it was asked with.
#[cfg(test)]
pub(crate) struct ScriptedLines {
    lines: mpsc::UnboundedReceiver<LineEvent>,
    prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedLines {
    /// Fixed script; `Eof` once it runs out.
    pub(crate) fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, scripted) = Self::channel();
        for line in lines {
            tx.send(LineEvent::Line(line.into())).ok();
        }
        scripted
    }

    /// Script driven by the test; `Eof` once the sender is dropped.
    pub(crate) fn channel() -> (mpsc::UnboundedSender<LineEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                lines: rx,
                prompts: Vec::new(),
            },
        )
    }

    pub(crate) fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

#[cfg(test)]
#[async_trait]
impl LineSource for ScriptedLines {
    async fn read_line(&mut self, prompt: &str) -> LineEvent {
        self.prompts.push(prompt.to_string());
        self.lines.recv().await.unwrap_or(LineEvent::Eof)
    }
}
