//! Room view: the message list of one room, kept in sync with its event
//! stream, and the form posting new messages.

mod viewport;

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::task::JoinHandle;

use crate::{
    cache::{CachedState, SessionStore},
    dto::{ChatMessage, SendForm},
    error::ClientError,
    formatter::MessageFormatter,
    identity::Identity,
    transport::{ChatApi, Subscription},
    ui::Alerter,
};

pub use viewport::Viewport;

/// Cache key the message list is stored under.
pub const MESSAGES_CACHE_KEY: &str = "messages";
/// Event type carrying chat messages on the room stream.
pub const DATA_EVENT: &str = "data";
/// Text of the alert raised when a message could not be sent.
pub const SEND_FAILURE_ALERT: &str = "Error";

/// Result of appending one received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    pub message: ChatMessage,
    /// The viewport was at its bottom and followed the new message
    pub followed: bool,
}

/// A mounted room.
///
/// Lives as long as its identity. Dropping it (or calling
/// [`RoomView::unmount`]) stops listening to the room stream; sends already in
/// flight still run to completion.
pub struct RoomView {
    identity: Identity,
    api: Arc<dyn ChatApi>,
    alerter: Arc<dyn Alerter>,
    messages: CachedState<Vec<ChatMessage>>,
    subscription: Subscription,
    viewport: Viewport,
}

impl RoomView {
    /// Subscribe to the room stream and restore the cached message list.
    ///
    /// The viewport starts at the bottom of the restored list.
    pub async fn mount(
        identity: Identity,
        store: SessionStore,
        api: Arc<dyn ChatApi>,
        alerter: Arc<dyn Alerter>,
        viewport_height: usize,
    ) -> Result<Self, ClientError> {
        let subscription = api.subscribe(identity.room).await?;
        let messages = CachedState::new(store, MESSAGES_CACHE_KEY, Vec::new())?;

        let mut viewport = Viewport::new(viewport_height);
        viewport.set_content_height(MessageFormatter::transcript_lines(messages.get()).len());
        viewport.scroll_to_bottom();

        tracing::info!(
            "Joined room {} as '{}' ({} cached message(s))",
            identity.room,
            identity.name,
            messages.get().len()
        );

        Ok(Self {
            identity,
            api,
            alerter,
            messages,
            subscription,
            viewport,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.get()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Wait for the next chat message on the room stream and append it.
    ///
    /// Events of other types are skipped. Returns `None` once the stream is
    /// closed for good.
    ///
    /// Cancel-safe: an event is consumed only when it is appended.
    pub async fn next_message(&mut self) -> Option<Result<AppendOutcome, ClientError>> {
        loop {
            let event = match self.subscription.next().await? {
                Ok(event) => event,
                Err(e) => return Some(Err(e)),
            };

            if event.event != DATA_EVENT {
                tracing::trace!("Skipping '{}' event", event.event);
                continue;
            }
            return Some(self.receive(&event.data));
        }
    }

    /// Append the message carried by one `data` event.
    ///
    /// Scroll-follow: if the viewport was exactly at its bottom before the
    /// append, it moves to the new bottom; otherwise it stays where it is.
    pub fn receive(&mut self, data: &str) -> Result<AppendOutcome, ClientError> {
        let message: ChatMessage =
            serde_json::from_str(data).map_err(|source| ClientError::MalformedEvent {
                data: data.to_string(),
                source,
            })?;

        let followed = self.viewport.is_scrolled_to_bottom();
        self.messages.modify(|messages| messages.push(message.clone()))?;

        self.viewport
            .grow(MessageFormatter::chat_message_lines(&message).len());
        if followed {
            self.viewport.scroll_to_bottom();
        }

        tracing::debug!(
            "Message from '{}' appended to room {} (followed: {})",
            message.name,
            self.identity.room,
            followed
        );
        Ok(AppendOutcome { message, followed })
    }

    /// Submit the message form.
    ///
    /// A blank input is ignored and left as is. Otherwise the input is
    /// cleared right away and one send request is spawned; a failed send
    /// raises exactly one alert. The message shows up once the server echoes
    /// it on the stream.
    pub fn submit(&self, input: &mut String) -> Option<JoinHandle<()>> {
        if input.trim().is_empty() {
            return None;
        }

        let form = SendForm {
            name: self.identity.name.clone(),
            message: std::mem::take(input),
        };
        let room = self.identity.room;
        let api = Arc::clone(&self.api);
        let alerter = Arc::clone(&self.alerter);

        Some(tokio::spawn(async move {
            match api.send(room, &form).await {
                Ok(StatusCode::OK) => tracing::debug!("Message sent to room {}", room),
                Ok(status) => {
                    tracing::warn!("Sending to room {} failed with status {}", room, status);
                    alerter.alert(SEND_FAILURE_ALERT);
                }
                Err(e) => {
                    tracing::warn!("Sending to room {} failed: {}", room, e);
                    alerter.alert(SEND_FAILURE_ALERT);
                }
            }
        }))
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.viewport.scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.viewport.scroll_down(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.viewport.scroll_to_bottom();
    }

    /// Transcript lines in view, with the index of the first one.
    pub fn visible_lines(&self) -> (usize, Vec<String>) {
        let range = self.viewport.visible_range();
        let first = range.start;
        let lines = MessageFormatter::transcript_lines(self.messages.get())
            .into_iter()
            .skip(range.start)
            .take(range.len())
            .collect();
        (first, lines)
    }

    /// Stop listening to the room stream.
    pub fn unmount(mut self) {
        self.subscription.close();
        tracing::info!("Left room {}", self.identity.room);
    }
}
