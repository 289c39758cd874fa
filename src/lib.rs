//! XAPI - dynamic client for session-based hypervisor management APIs
//!
//! This is the main convenience crate that re-exports all XAPI sub-crates.
//! Use this crate if you want a single dependency that provides the client
//! and the core protocol types.
//!
//! # Architecture
//!
//! XAPI is organized into modular crates:
//!
//! - **xapi-core**: Response envelope, error types, and the failure taxonomy
//! - **xapi-client**: Session-managing client with namespace dispatch and
//!   bounded reconnect retry
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xapi::ClientBuilder;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("ws://pool-master.example:80/").build()?;
//!     client.login_with_password("root", "secret").await?;
//!
//!     // Synchronous call: VM.get_all
//!     let vms = client.vm().call("get_all", vec![]).await?;
//!     println!("VMs: {}", vms);
//!
//!     // Asynchronous call: Async.VM.clone returns a task reference
//!     let task = client
//!         .async_()
//!         .namespace("VM")
//!         .call("clone", vec![json!("OpaqueRef:..."), json!("copy")])
//!         .await?;
//!     println!("Task: {}", task);
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```

// Re-export all public APIs from sub-crates
// This allows users to access everything through `xapi::` prefix
pub use xapi_client as client;
pub use xapi_core as core;

// Convenience re-exports of the most commonly used types
// This avoids needing to write `xapi::client::Client`
pub use xapi_client::{AsyncDispatcher, Client, ClientBuilder, Dispatcher, Transport};
pub use xapi_core::{ApiError, Error, ErrorKind, Result};
