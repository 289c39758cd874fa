//! Common test utilities for xapi-client integration tests
//!
//! This module provides a scripted in-memory transport for exercising call
//! semantics without a socket, and a mock WebSocket server for testing the
//! real transport.
#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use xapi_client::Transport;
use xapi_core::{Error, Result};

/// Scripted transport: returns pre-arranged results in order and records
/// every round trip it was asked to perform.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    resets: AtomicU32,
}

impl MockTransport {
    pub fn script(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            resets: AtomicU32::new(0),
        }
    }

    /// The (method, params) pairs seen so far, in order
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_count(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn round_trip(&self, method: &str, params: &[Value]) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.to_vec()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to {method}"))
    }

    async fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// A success envelope carrying `value`
pub fn success(value: Value) -> Result<Value> {
    Ok(json!({"Status": "Success", "Value": value}))
}

/// A failure envelope with the given error descriptor
pub fn failure(description: &[&str]) -> Result<Value> {
    Ok(json!({"Status": "Failure", "ErrorDescription": description}))
}

/// A transport-level connection reset
pub fn reset() -> Result<Value> {
    Err(Error::ConnectionReset)
}

/// Mock WebSocket server for transport testing
///
/// Accepts connections and feeds each text frame to the handler; `Some`
/// replies with the returned frame, `None` closes the connection.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
}

impl MockWsServer {
    pub async fn with_handler<F, Fut>(handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = Option<String>> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            let Ok(mut ws) = accept_async(stream).await else { return };
                            while let Some(Ok(message)) = ws.next().await {
                                if let Message::Text(text) = message {
                                    match handler(text).await {
                                        Some(reply) => {
                                            if ws.send(Message::Text(reply)).await.is_err() {
                                                break;
                                            }
                                        }
                                        None => break,
                                    }
                                }
                            }
                        });
                    }
                }
            }
        });

        Self { addr, shutdown_tx }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
