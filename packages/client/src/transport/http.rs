//! Chat server access over HTTP: SSE subscription and form posts.

use futures_util::StreamExt;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, CACHE_CONTROL},
};
use tokio::sync::mpsc;

use async_trait::async_trait;

use crate::{dto::SendForm, error::ClientError};

use super::{
    ChatApi, Subscription, SubscriptionItem,
    reconnect::{ReconnectPolicy, should_attempt_reconnect},
    sse::SseDecoder,
};

const EVENT_STREAM: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

/// [`ChatApi`] backed by the server's HTTP endpoints.
///
/// - `GET {base_url}/{room}/messages`: server-sent events
/// - `POST {base_url}/{room}/send`: form-encoded `name`, `message`
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
    reconnect: ReconnectPolicy,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>, reconnect: ReconnectPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            reconnect,
        }
    }

    pub fn messages_url(&self, room: i64) -> String {
        format!("{}/{}/messages", self.base_url, room)
    }

    pub fn send_url(&self, room: i64) -> String {
        format!("{}/{}/send", self.base_url, room)
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    /// Connect to the room stream and hand it to a listener task.
    ///
    /// A refused stream (non-200) is returned as an error. A connection
    /// failure is left to the listener: it counts as its first failed
    /// attempt, and the next one comes after the reconnect delay.
    async fn subscribe(&self, room: i64) -> Result<Subscription, ClientError> {
        let url = self.messages_url(room);

        let first = match open_stream(&self.client, &url, None).await {
            Ok(response) => {
                tracing::info!("Subscribed to {}", url);
                Ok(response)
            }
            Err(ClientError::RequestError(e)) => {
                tracing::warn!("Could not connect to {}: {}", url, e);
                Err(ClientError::RequestError(e))
            }
            Err(e) => return Err(e),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let listener = tokio::spawn(listen(self.client.clone(), url, first, self.reconnect, tx));

        Ok(Subscription::new(rx, listener))
    }

    async fn send(&self, room: i64, form: &SendForm) -> Result<StatusCode, ClientError> {
        let response = self
            .client
            .post(self.send_url(room))
            .form(form)
            .send()
            .await?;

        tracing::debug!("POST {} -> {}", self.send_url(room), response.status());
        Ok(response.status())
    }
}

async fn open_stream(
    client: &Client,
    url: &str,
    last_event_id: Option<&str>,
) -> Result<Response, ClientError> {
    let mut request = client
        .get(url)
        .header(ACCEPT, EVENT_STREAM)
        .header(CACHE_CONTROL, "no-cache");
    if let Some(id) = last_event_id {
        request = request.header(LAST_EVENT_ID, id);
    }

    let response = request.send().await?;
    if response.status() != StatusCode::OK {
        return Err(ClientError::UnexpectedStatus(response.status().as_u16()));
    }
    Ok(response)
}

/// Why one connection's body stopped being read.
enum StreamEnd {
    /// The server ended the body
    Closed,
    /// Reading the body failed
    Interrupted(reqwest::Error),
    /// Nobody listens anymore
    Unsubscribed,
}

/// Listener task: pump the current connection, reconnect when it ends.
///
/// `first` is the outcome of the initial connect made by `subscribe`.
async fn listen(
    client: Client,
    url: String,
    first: Result<Response, ClientError>,
    policy: ReconnectPolicy,
    tx: mpsc::UnboundedSender<SubscriptionItem>,
) {
    let mut decoder = SseDecoder::new();
    let mut next = Some(first);
    let mut failed_attempts = 0;

    loop {
        let attempt = match next.take() {
            Some(attempt) => attempt,
            None => open_stream(&client, &url, decoder.last_event_id())
                .await
                .inspect(|_| tracing::info!("Reconnected to {}", url)),
        };

        let response = match attempt {
            Ok(response) => response,
            Err(e) => {
                failed_attempts += 1;
                if !should_attempt_reconnect(&e, failed_attempts, policy.max_attempts) {
                    tracing::error!(
                        "Giving up on {} after {} failed attempt(s): {}",
                        url,
                        failed_attempts,
                        e
                    );
                    tx.send(Err(e)).ok();
                    return;
                }

                let delay = policy.delay(decoder.retry());
                tracing::warn!(
                    "Connection to {} failed: {}. Reconnecting in {:?} (attempt {}/{})",
                    url,
                    e,
                    delay,
                    failed_attempts + 1,
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
                continue;
            }
        };
        failed_attempts = 0;

        match pump(response, &mut decoder, &tx).await {
            StreamEnd::Unsubscribed => {
                tracing::debug!("Stopped listening to {}", url);
                return;
            }
            StreamEnd::Closed => tracing::warn!("Event stream {} closed by server", url),
            StreamEnd::Interrupted(e) => tracing::warn!("Event stream {} interrupted: {}", url, e),
        }
        decoder.finish();

        if tx.is_closed() {
            return;
        }
        tokio::time::sleep(policy.delay(decoder.retry())).await;
    }
}

async fn pump(
    response: Response,
    decoder: &mut SseDecoder,
    tx: &mpsc::UnboundedSender<SubscriptionItem>,
) -> StreamEnd {
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return StreamEnd::Interrupted(e),
        };

        for event in decoder.feed(&chunk) {
            tracing::trace!("Event '{}' received ({} bytes)", event.event, event.data.len());
            if tx.send(Ok(event)).is_err() {
                return StreamEnd::Unsubscribed;
            }
        }
    }

    StreamEnd::Closed
}
