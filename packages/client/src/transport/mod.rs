//! Access to the chat server: room event stream and message sending.
//!
//! The event stream is exposed as a channel. A listener task pushes decoded
//! events onto it; the room view drains it. Dropping the [`Subscription`]
//! stops the listener.

mod http;
mod reconnect;
mod sse;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{dto::SendForm, error::ClientError};

pub use http::HttpChatApi;
pub use reconnect::{
    MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL, ReconnectPolicy, should_attempt_reconnect,
    should_exit_immediately,
};
pub use sse::{DEFAULT_EVENT_TYPE, SseDecoder, SseEvent};

/// One item delivered by a subscription.
pub type SubscriptionItem = Result<SseEvent, ClientError>;

/// The chat server, as seen by the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Start listening to the event stream of `room`.
    async fn subscribe(&self, room: i64) -> Result<Subscription, ClientError>;

    /// Post a message to `room`, returning the response status.
    async fn send(&self, room: i64, form: &SendForm) -> Result<StatusCode, ClientError>;
}

/// Live event stream of one room.
///
/// Closing (or dropping) the subscription aborts its listener task and drops
/// the receiving end of the channel.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SubscriptionItem>,
    listener: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<SubscriptionItem>, listener: JoinHandle<()>) -> Self {
        Self {
            events,
            listener: Some(listener),
        }
    }

    /// Subscription fed directly through the returned sender.
    pub fn channel() -> (mpsc::UnboundedSender<SubscriptionItem>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            tx,
            Self {
                events: rx,
                listener: None,
            },
        )
    }

    /// Next event, or `None` once the stream is closed.
    ///
    /// Cancel-safe.
    pub async fn next(&mut self) -> Option<SubscriptionItem> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
