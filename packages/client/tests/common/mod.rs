//! In-process chat servers for integration tests.
//!
//! [`StubServer`] is the chat server stub:
//! - `GET /{room}/messages`: server-sent events, one `data` event per message
//! - `POST /{room}/send`: form-encoded `name`, `message`; echoed to the room
//!
//! [`ScriptedTcpServer`] answers each connection as scripted, for connection
//! failures the stub cannot produce.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    convert::Infallible,
    io::Write,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
    routing::{get, post},
};
use futures_util::{StreamExt, stream::BoxStream};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc},
};

use hiroba_client::{
    dto::{ChatMessage, SendForm},
    ui::{Alerter, LineEvent, LineSource},
};
use hiroba_shared::time::now_millis;

/// One event of a scripted stream connection.
#[derive(Debug, Clone)]
pub struct ScriptedEvent {
    pub id: String,
    pub data: String,
    pub retry: Option<Duration>,
}

impl ScriptedEvent {
    pub fn message(id: &str, message: &ChatMessage) -> Self {
        Self {
            id: id.to_string(),
            data: serde_json::to_string(message).unwrap(),
            retry: None,
        }
    }

    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    fn into_event(self) -> Event {
        let event = Event::default().event("data").id(self.id).data(self.data);
        match self.retry {
            Some(retry) => event.retry(retry),
            None => event,
        }
    }
}

#[derive(Clone, Default)]
struct StubState {
    rooms: Arc<Mutex<HashMap<i64, broadcast::Sender<String>>>>,
    failing_rooms: Arc<Mutex<HashSet<i64>>>,
    /// Per room, the events of the next stream connections; each ends after its events
    scripts: Arc<Mutex<HashMap<i64, VecDeque<Vec<ScriptedEvent>>>>>,
    /// `Last-Event-ID` sent with each stream connection, in connection order
    last_event_ids: Arc<Mutex<HashMap<i64, Vec<Option<String>>>>>,
}

impl StubState {
    fn room(&self, room: i64) -> broadcast::Sender<String> {
        self.rooms
            .lock()
            .unwrap()
            .entry(room)
            .or_insert_with(|| broadcast::channel(64).0)
            .clone()
    }
}

/// Chat server stub listening on an ephemeral local port.
pub struct StubServer {
    addr: SocketAddr,
    state: StubState,
    server: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/{room}/messages", get(messages))
            .route("/{room}/send", post(send))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Broadcast a chat message to everyone listening to `room`.
    pub fn publish(&self, room: i64, message: &ChatMessage) {
        self.publish_raw(room, &serde_json::to_string(message).unwrap());
    }

    /// Broadcast an arbitrary `data` payload to `room`.
    pub fn publish_raw(&self, room: i64, data: &str) {
        self.state.room(room).send(data.to_string()).ok();
    }

    /// Serve the next stream connection to `room` with `events`, then end
    /// its body. Connections beyond the scripted ones get the live stream.
    pub fn script_connection(&self, room: i64, events: Vec<ScriptedEvent>) {
        self.state
            .scripts
            .lock()
            .unwrap()
            .entry(room)
            .or_default()
            .push_back(events);
    }

    /// `Last-Event-ID` header of every stream connection made to `room` so far.
    pub fn last_event_ids(&self, room: i64) -> Vec<Option<String>> {
        self.state
            .last_event_ids
            .lock()
            .unwrap()
            .get(&room)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every send to `room` fail with a server error.
    pub fn fail_sends_to(&self, room: i64) {
        self.state.failing_rooms.lock().unwrap().insert(room);
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn messages(
    Path(room): Path<i64>,
    State(state): State<StubState>,
    headers: HeaderMap,
) -> Sse<KeepAliveStream<BoxStream<'static, Result<Event, Infallible>>>> {
    let last_event_id = headers
        .get("last-event-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .last_event_ids
        .lock()
        .unwrap()
        .entry(room)
        .or_default()
        .push(last_event_id);

    let script = state
        .scripts
        .lock()
        .unwrap()
        .get_mut(&room)
        .and_then(VecDeque::pop_front);

    let stream = match script {
        Some(events) => futures_util::stream::iter(
            events
                .into_iter()
                .map(|event| Ok::<_, Infallible>(event.into_event())),
        )
        .boxed(),
        None => {
            let rx = state.room(room).subscribe();
            futures_util::stream::unfold(rx, |mut rx| async move {
                loop {
                    match rx.recv().await {
                        Ok(data) => {
                            return Some((Ok::<_, Infallible>(Event::default().event("data").data(data)), rx));
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            })
            .boxed()
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn send(
    Path(room): Path<i64>,
    State(state): State<StubState>,
    Form(form): Form<SendForm>,
) -> StatusCode {
    if state.failing_rooms.lock().unwrap().contains(&room) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let message = ChatMessage {
        name: form.name,
        message: form.message,
        timestamp: now_millis(),
    };
    state
        .room(room)
        .send(serde_json::to_string(&message).unwrap())
        .ok();
    StatusCode::OK
}

/// How [`ScriptedTcpServer`] answers one connection.
#[derive(Debug, Clone)]
pub enum TcpAction {
    /// Close the connection without answering
    Drop,
    /// Answer with an event stream carrying `body`, then close it
    Respond(String),
    /// Answer with an event stream carrying `body` and keep it open
    RespondAndHold(String),
}

/// Raw TCP server answering connections in script order.
///
/// Connections beyond the script are dropped.
pub struct ScriptedTcpServer {
    addr: SocketAddr,
    accepted_at: Arc<Mutex<Vec<Instant>>>,
    server: tokio::task::JoinHandle<()>,
}

impl ScriptedTcpServer {
    pub async fn start(script: Vec<TcpAction>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted_at = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&accepted_at);

        let server = tokio::spawn(async move {
            let mut script = VecDeque::from(script);
            let mut held = Vec::new();
            while let Ok((mut socket, _)) = listener.accept().await {
                recorded.lock().unwrap().push(Instant::now());
                match script.pop_front().unwrap_or(TcpAction::Drop) {
                    TcpAction::Drop => drop(socket),
                    TcpAction::Respond(body) => respond(&mut socket, &body).await,
                    TcpAction::RespondAndHold(body) => {
                        respond(&mut socket, &body).await;
                        held.push(socket);
                    }
                }
            }
        });

        Self {
            addr,
            accepted_at,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// When each connection was accepted.
    pub fn accepted_at(&self) -> Vec<Instant> {
        self.accepted_at.lock().unwrap().clone()
    }
}

impl Drop for ScriptedTcpServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// `data` event in wire format.
pub fn sse_data(message: &ChatMessage) -> String {
    format!("event: data\ndata: {}\n\n", serde_json::to_string(message).unwrap())
}

async fn respond(socket: &mut TcpStream, body: &str) {
    let mut request = Vec::new();
    let mut buf = [0_u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n{}",
        body
    );
    socket.write_all(response.as_bytes()).await.ok();
    socket.flush().await.ok();
}

/// Alerter remembering every alert.
#[derive(Default)]
pub struct RecordingAlert {
    alerts: Mutex<Vec<String>>,
}

impl RecordingAlert {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Alerter for RecordingAlert {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

/// Line source fed by the test; `Eof` once the sender is dropped.
pub struct ChannelLines {
    lines: mpsc::UnboundedReceiver<String>,
}

impl ChannelLines {
    pub fn new() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { lines: rx })
    }
}

#[async_trait]
impl LineSource for ChannelLines {
    async fn read_line(&mut self, _prompt: &str) -> LineEvent {
        match self.lines.recv().await {
            Some(line) => LineEvent::Line(line),
            None => LineEvent::Eof,
        }
    }
}

/// Output shared with the test while the client writes to it.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
