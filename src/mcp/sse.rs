//! Server-sent events transport.
//!
//! Two HTTP endpoints share one [`Dispatcher`]:
//!
//! - `GET <sse_path>` opens the event stream. The first event is `endpoint`,
//!   whose data is the path clients must POST messages to.
//! - `POST <message_path>` takes one raw JSON-RPC message and answers
//!   `202 Accepted` straight away. The JSON-RPC reply is pushed later as a
//!   `message` event on the event stream.
//!
//! Only one event stream is live at a time. Opening a new one supersedes the
//! previous stream, and a reply produced while no stream is live is dropped
//! with a warning. Streams are closed after the configured channel timeout.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Router,
};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::error::ConfigError;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::{JsonRpcError, OutgoingMessage};

/// An event queued for the live event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Announces where clients POST messages.
    Endpoint(String),
    /// A serialised JSON-RPC reply.
    Message(String),
}

impl PushEvent {
    fn into_sse(self) -> Event {
        match self {
            Self::Endpoint(path) => Event::default().event("endpoint").data(path),
            Self::Message(json) => Event::default().event("message").data(json),
        }
    }
}

/// The live event stream's sending half.
struct ActiveChannel {
    id: Uuid,
    tx: mpsc::UnboundedSender<PushEvent>,
}

/// Shared state behind both endpoints.
#[derive(Clone)]
pub struct SseHub {
    dispatcher: Arc<Dispatcher>,
    active: Arc<Mutex<Option<ActiveChannel>>>,
    message_path: Arc<str>,
}

impl SseHub {
    /// Creates a hub announcing `message_path` to new streams.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, message_path: &str) -> Self {
        Self {
            dispatcher,
            active: Arc::new(Mutex::new(None)),
            message_path: Arc::from(message_path),
        }
    }

    /// Opens a new event stream and makes it the live one.
    ///
    /// The returned stream starts with the `endpoint` event.
    #[must_use]
    pub fn open_channel(&self) -> ChannelStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        // The receiver is alive, so this cannot fail
        let _ = tx.send(PushEvent::Endpoint(self.message_path.to_string()));

        if let Some(previous) = self.active.lock().replace(ActiveChannel { id, tx }) {
            info!(previous = %previous.id, channel = %id, "SSE channel superseded");
        }
        info!(channel = %id, endpoint = %self.message_path, "SSE channel opened");

        ChannelStream {
            inner: UnboundedReceiverStream::new(rx),
            _guard: ChannelGuard {
                active: Arc::clone(&self.active),
                id,
            },
        }
    }

    /// Returns `true` if an event stream is live.
    #[must_use]
    pub fn has_active_channel(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Pushes a reply onto the live event stream.
    ///
    /// Returns `false` if the reply was dropped.
    pub fn deliver(&self, message: &OutgoingMessage) -> bool {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "Failed to serialise response");
                return false;
            }
        };

        let mut active = self.active.lock();
        let Some(channel) = active.as_ref() else {
            warn!(id = ?message.id(), "No active SSE channel, dropping response");
            return false;
        };

        if channel.tx.send(PushEvent::Message(json)).is_err() {
            warn!(channel = %channel.id, "SSE channel closed, dropping response");
            *active = None;
            return false;
        }

        debug!(channel = %channel.id, id = ?message.id(), "Sent response");
        true
    }

    /// Decodes a raw POST body and dispatches it.
    ///
    /// A body that is not UTF-8 is answered with a parse error, as on the
    /// line pipe.
    pub async fn dispatch_bytes(&self, body: Vec<u8>) {
        match String::from_utf8(body) {
            Ok(body) => self.dispatch(body).await,
            Err(e) => {
                warn!(error = %e, "Rejecting undecodable message body");
                self.deliver(&JsonRpcError::parse_error(e).into());
            }
        }
    }

    /// Dispatches one decoded message and pushes the reply, if any.
    pub async fn dispatch(&self, body: String) {
        let dispatcher = Arc::clone(&self.dispatcher);

        // Tool calls block on file I/O; keep them off the async workers
        let reply = match tokio::task::spawn_blocking(move || dispatcher.handle_message(&body)).await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Dispatch task failed");
                Some(JsonRpcError::internal_error(None, format!("Internal error: {e}")).into())
            }
        };

        if let Some(reply) = reply {
            self.deliver(&reply);
        }
    }

    /// Drops the live channel, ending its event stream.
    pub fn close(&self) {
        if let Some(channel) = self.active.lock().take() {
            info!(channel = %channel.id, "SSE channel closed");
        }
    }
}

/// Clears the live channel when its stream goes away, unless superseded.
struct ChannelGuard {
    active: Arc<Mutex<Option<ActiveChannel>>>,
    id: Uuid,
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|channel| channel.id == self.id) {
            *active = None;
            info!(channel = %self.id, "SSE client disconnected");
        }
    }
}

/// Events of one event stream, in send order.
pub struct ChannelStream {
    inner: UnboundedReceiverStream<PushEvent>,
    _guard: ChannelGuard,
}

impl Stream for ChannelStream {
    type Item = PushEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// HTTP server for the SSE transport.
pub struct SseServer {
    hub: SseHub,
    addr: SocketAddr,
    sse_path: String,
    message_path: String,
    channel_timeout: Duration,
}

impl SseServer {
    /// Creates the server from the transport configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is invalid.
    pub fn new(dispatcher: Arc<Dispatcher>, config: &TransportConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            hub: SseHub::new(dispatcher, &config.message_path),
            addr: config.bind_addr()?,
            sse_path: config.sse_path.clone(),
            message_path: config.message_path.clone(),
            channel_timeout: config.channel_timeout(),
        })
    }

    /// Returns the shared hub.
    #[must_use]
    pub const fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.sse_path, get(open_stream))
            .route(&self.message_path, post(post_message))
            .with_state(AppState {
                hub: self.hub.clone(),
                channel_timeout: self.channel_timeout,
            })
    }

    /// Start the server and serve until a termination signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn run(self) -> std::io::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!(
            addr = %self.addr,
            sse = %self.sse_path,
            messages = %self.message_path,
            "SSE server listening"
        );

        let hub = self.hub.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                // Ends the open event stream so the connection can drain
                hub.close();
            })
            .await
    }
}

#[derive(Clone)]
struct AppState {
    hub: SseHub,
    channel_timeout: Duration,
}

/// Opens the event stream.
async fn open_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state
        .hub
        .open_channel()
        .map(|event| Ok(event.into_sse()))
        .take_until(tokio::time::sleep(state.channel_timeout));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Accepts one JSON-RPC message; the reply goes out on the event stream.
async fn post_message(State(state): State<AppState>, body: Bytes) -> StatusCode {
    state.hub.dispatch_bytes(body.to_vec()).await;
    StatusCode::ACCEPTED
}

/// Resolves on SIGINT/SIGTERM (Ctrl+C elsewhere).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT, initiating graceful shutdown"),
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C, initiating graceful shutdown");
    }
}
