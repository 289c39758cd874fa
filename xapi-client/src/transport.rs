//! Transport collaborator for RPC round trips
//!
//! The client core treats the wire as an opaque capability: one fully
//! qualified method name plus an ordered argument list in, one raw response
//! envelope out. The [`Transport`] trait captures that contract; the default
//! [`WsTransport`] implementation carries calls as single JSON text frames
//! over a WebSocket connection.
//!
//! # Connection Lifecycle
//!
//! `WsTransport` connects lazily on the first round trip and caches the
//! connection. [`Transport::reset`] discards the cached connection; the next
//! round trip reconnects. The client uses this after a connection-reset
//! failure to force a fresh connection before retrying.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_tungstenite::{
    connect_async, tungstenite, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use xapi_core::{Error, Result};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// One request/response round trip to the remote API
///
/// Implementations are responsible for wire encoding and connectivity;
/// envelope interpretation and retry policy live in the client. The
/// round-trip method must return [`Error::ConnectionReset`] for the
/// peer-closed / broken-pipe class of failures so the client can tell
/// retryable connectivity loss apart from everything else.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one RPC round trip and return the raw response envelope
    async fn round_trip(&self, method: &str, params: &[Value]) -> Result<Value>;

    /// Discard any cached connection; the next round trip reconnects lazily
    async fn reset(&self);
}

#[derive(Serialize)]
struct WireCall<'a> {
    method: &'a str,
    params: &'a [Value],
}

/// Default WebSocket transport
///
/// Calls are serialized as `{"method": ..., "params": [...]}` text frames;
/// the next text frame received is the response envelope. Round trips are
/// serialized on the cached connection, matching the one-session-per-client
/// model.
pub struct WsTransport {
    endpoint: String,
    timeout: Option<Duration>,
    stream: Mutex<Option<WsStream>>,
}

impl WsTransport {
    /// Create a transport for the given endpoint
    ///
    /// No connection is made until the first round trip. An optional
    /// timeout bounds each round trip; the client adds no deadline of
    /// its own.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
            stream: Mutex::new(None),
        }
    }

    /// The endpoint this transport connects to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(stream: &mut WsStream, frame: String) -> Result<Value> {
        stream
            .send(Message::Text(frame))
            .await
            .map_err(classify_ws_error)?;

        while let Some(message) = stream.next().await {
            match message.map_err(classify_ws_error)? {
                Message::Text(text) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| Error::Serialization(e.to_string()));
                }
                Message::Close(_) => return Err(Error::ConnectionReset),
                _ => {} // ping/pong and binary frames are not part of the call protocol
            }
        }

        // Stream ended without a response frame
        Err(Error::ConnectionReset)
    }
}

#[async_trait]
impl Transport for WsTransport {
    #[tracing::instrument(skip(self, params), fields(method = method))]
    async fn round_trip(&self, method: &str, params: &[Value]) -> Result<Value> {
        let frame = serde_json::to_string(&WireCall { method, params })
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            tracing::debug!(endpoint = %self.endpoint, "Connecting to server");
            let (ws_stream, _) = connect_async(&self.endpoint)
                .await
                .map_err(classify_ws_error)?;
            *guard = Some(ws_stream);
        }

        let stream = guard
            .as_mut()
            .ok_or_else(|| Error::Transport("connection missing after connect".to_string()))?;

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, Self::exchange(stream, frame)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout),
            },
            None => Self::exchange(stream, frame).await,
        };

        if result.is_err() {
            // Connection state is unknown after a failed exchange
            *guard = None;
        }

        result
    }

    async fn reset(&self) {
        tracing::debug!(endpoint = %self.endpoint, "Discarding cached connection");
        *self.stream.lock().await = None;
    }
}

/// Classify a WebSocket error into the client's retry categories
///
/// The connection-reset class (peer closed, broken pipe, aborted, EOF) is
/// retryable with bounded backoff; everything else propagates as a plain
/// transport error.
fn classify_ws_error(error: tungstenite::Error) -> Error {
    use std::io::ErrorKind;
    use tungstenite::Error as WsError;

    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => Error::ConnectionReset,
        WsError::Io(io) => match io.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Error::ConnectionReset,
            _ => Error::Transport(io.to_string()),
        },
        other => Error::Transport(other.to_string()),
    }
}
