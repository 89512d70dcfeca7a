//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; complete lines are interpreted as they
//! become available and an event is dispatched on every blank line. Lines end
//! with LF or CRLF.

use std::time::Duration;

/// Event type used when a block has no `event:` field
pub const DEFAULT_EVENT_TYPE: &str = "message";

const BOM: char = '\u{FEFF}';

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, or [`DEFAULT_EVENT_TYPE`]
    pub event: String,
    /// `data:` lines joined with `\n`
    pub data: String,
    /// Last event ID at dispatch time (empty if never set)
    pub id: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, incomplete line
    buffer: Vec<u8>,
    event_type: String,
    data: String,
    last_event_id: String,
    retry: Option<Duration>,
    started: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning the events it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let text = String::from_utf8_lossy(&raw[..end]);
            let mut line: &str = text.strip_suffix('\r').unwrap_or(&text);

            if !self.started {
                self.started = true;
                line = line.strip_prefix(BOM).unwrap_or(line);
            }

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Drop any partially received event; called when the body ends.
    ///
    /// The last event ID and the reconnection delay are kept for the next
    /// connection.
    pub fn finish(&mut self) {
        self.buffer.clear();
        self.event_type.clear();
        self.data.clear();
        self.started = false;
    }

    /// Last event ID seen, to be sent back as `Last-Event-ID` on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        (!self.last_event_id.is_empty()).then_some(self.last_event_id.as_str())
    }

    /// Reconnection delay requested by the server with `retry:`.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if !value.is_empty()
                    && value.bytes().all(|b| b.is_ascii_digit())
                    && let Ok(millis) = value.parse::<u64>()
                {
                    self.retry = Some(Duration::from_millis(millis));
                }
            }
            other => tracing::trace!("Ignoring unknown SSE field '{}'", other),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = std::mem::take(&mut self.event_type);
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();

        Some(SseEvent {
            event: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            id: self.last_event_id.clone(),
        })
    }
}
