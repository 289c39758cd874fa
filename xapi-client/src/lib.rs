//! Session-managing client for namespaced hypervisor APIs
//!
//! This crate provides a dynamic RPC client for session-based
//! hypervisor-management APIs. Remote methods are addressed by
//! dot-separated namespace chains built at call time; the client exposes no
//! fixed method table. It includes:
//!
//! - **Session management**: automatic token acquisition, injection on
//!   every call, and transparent renewal when the server invalidates the
//!   session
//! - **Namespace dispatch**: `client.namespace("VM").call("get_all", ...)`
//!   plus typed accessors for the common namespaces
//! - **Async call framing**: `client.async_()` chains carry the `Async.`
//!   wire prefix, turning the call into a server-side background task
//! - **Bounded reconnect retry**: connection resets are retried with
//!   exponential backoff, capped at 3 attempts by default
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xapi_client::ClientBuilder;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("ws://pool-master.example:80/").build()?;
//!     client.login_with_password("root", "secret").await?;
//!
//!     let vms = client.vm().call("get_all", vec![]).await?;
//!     println!("VMs: {}", vms);
//!
//!     let record = client
//!         .vm()
//!         .call("get_record", vec![json!("OpaqueRef:...")])
//!         .await?;
//!     println!("{}", record);
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Re-establishing Session State
//!
//! Server-side per-session state (event subscriptions, for example) is lost
//! when the session is renewed. Register a post-login hook to rebuild it
//! after every login and relogin:
//!
//! ```rust,no_run
//! # use xapi_client::{Client, ClientBuilder};
//! # async fn example() -> xapi_core::Result<()> {
//! # let client = ClientBuilder::new("ws://host/").build()?;
//! client
//!     .after_login(Box::new(|client: &Client| {
//!         Box::pin(async move {
//!             client
//!                 .event()
//!                 .call("register", vec![serde_json::json!(["*"])])
//!                 .await?;
//!             Ok(())
//!         })
//!     }))
//!     .await;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod builder;
mod client;
mod dispatcher;
mod transport;

pub use backoff::{ExponentialBackoff, FixedDelay, NoRetry, ReconnectPolicy};
pub use builder::ClientBuilder;
pub use client::{AfterLoginHook, Client};
pub use dispatcher::{AsyncDispatcher, Dispatcher};
pub use transport::{Transport, WsTransport};
