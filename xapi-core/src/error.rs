//! Error types for xapi
//!
//! This module provides the error handling for session-RPC operations.
//! It defines two main error types:
//!
//! - **Error**: everything that can go wrong during a call (uses thiserror)
//! - **ApiError**: a typed domain failure carried inside `Error::Api`
//!
//! # Error Categories
//!
//! The `Error` enum splits failures along the lines the client's retry policy
//! cares about:
//!
//! - **Protocol contract violations** (`ProtocolViolation`): the remote sent
//!   an envelope missing its `Status`, `Value`, or `ErrorDescription` field.
//!   Always fatal, never retried.
//! - **Session errors** (`SessionInvalid`, `LoginRequired`): `SessionInvalid`
//!   is an internal signal consumed by the client's relogin-and-retry path;
//!   callers only see it when recovery was impossible. `LoginRequired` means
//!   relogin was attempted before any login ever succeeded.
//! - **Transient connectivity** (`ConnectionReset`): the peer closed the
//!   connection mid-call. Recovered by discarding the cached connection and
//!   retrying with bounded backoff.
//! - **Domain failures** (`Api`): typed hypervisor errors from the failure
//!   taxonomy. Surfaced to the caller unchanged, never retried.

use crate::failure::ApiError;
use thiserror::Error;

/// Result type for xapi operations
///
/// This is a convenience type alias that uses the xapi `Error` type.
/// Used throughout the xapi crates for consistent error handling.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for xapi operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Typed domain failure reported by the remote API
    ///
    /// Carries the failure taxonomy kind plus the error-specific detail
    /// fields from the wire descriptor. The client never retries these;
    /// the caller decides what to do.
    #[error("API failure: {0}")]
    Api(#[from] ApiError),

    /// The remote rejected the session token
    ///
    /// Internal retry signal. The client catches this, replays the last
    /// successful login, and retries the call once. It only reaches the
    /// caller if the retried call is rejected again.
    #[error("session token rejected by the server")]
    SessionInvalid,

    /// Relogin was required but no login has ever succeeded
    ///
    /// Raised instead of looping when a session-invalid response arrives
    /// and there is no stored login call to replay.
    #[error("no prior login to replay; call a login method first")]
    LoginRequired,

    /// The response envelope violates the wire contract
    ///
    /// Missing `Status`, a `Success` without a `Value`, or a `Failure`
    /// without an `ErrorDescription`. Signals a broken endpoint or a
    /// transport bug; never retried.
    #[error("protocol contract violation: {0}")]
    ProtocolViolation(String),

    /// The peer closed the connection mid-call
    ///
    /// Connection-reset / broken-pipe class of transport failure. The
    /// client discards the cached connection and retries with bounded
    /// backoff.
    #[error("connection reset by peer")]
    ConnectionReset,

    /// Any other transport-level failure
    ///
    /// Covers connect failures, handshake errors, and frame-level problems
    /// below the RPC envelope. Not retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization or deserialization error
    ///
    /// Occurs when converting between Rust values and the wire encoding.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The round trip exceeded the configured timeout
    #[error("request timeout")]
    Timeout,

    /// The endpoint address could not be parsed
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// Whether this error belongs to the transient connectivity class
    ///
    /// Only these errors are eligible for the reconnect-retry path.
    pub fn is_connection_reset(&self) -> bool {
        matches!(self, Error::ConnectionReset)
    }
}
