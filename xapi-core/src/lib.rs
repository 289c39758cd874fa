//! Core protocol types for xapi
//!
//! This crate provides the foundational types for talking to a session-based
//! hypervisor-management API. It includes:
//!
//! - **Envelope**: interpretation of the structured response envelope
//!   (`Status` / `Value` / `ErrorDescription`)
//! - **Failure taxonomy**: the closed enumeration of hypervisor-domain error
//!   kinds with a generic fallback
//! - **Error handling**: the error types shared by all xapi crates
//!
//! # Architecture
//!
//! The crate is transport-agnostic: it interprets response envelopes but
//! doesn't dictate how they are carried. The `xapi-client` crate builds on
//! this foundation and adds session management, namespace dispatch, and a
//! default WebSocket transport.
//!
//! # Example
//!
//! ```rust
//! use xapi_core::{envelope, Error, ErrorKind};
//! use serde_json::json;
//!
//! let ok = envelope::interpret(json!({"Status": "Success", "Value": 42})).unwrap();
//! assert_eq!(ok, json!(42));
//!
//! let err = envelope::interpret(json!({
//!     "Status": "Failure",
//!     "ErrorDescription": ["SR_FULL", "sr-uuid"]
//! }));
//! match err {
//!     Err(Error::Api(failure)) => assert_eq!(failure.kind, ErrorKind::SrFull),
//!     _ => unreachable!(),
//! }
//! ```

pub mod envelope;
pub mod error;
pub mod failure;

// Re-export the most commonly used types for convenience
// This allows users to use `xapi_core::Error` instead of `xapi_core::error::Error`
pub use envelope::SESSION_INVALID;
pub use error::{Error, Result};
pub use failure::{ApiError, ErrorKind};
