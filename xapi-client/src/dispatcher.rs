//! Namespace accumulation and call forwarding
//!
//! Remote methods live in dot-separated namespaces (`VM.get_all`,
//! `host.get_servertime`) and the method surface is not fixed at compile
//! time. A [`Dispatcher`] accumulates one namespace segment per step and, at
//! the leaf, joins the segments with `.` and forwards the call to the owning
//! [`Client`](crate::Client). There is no caching: every chain builds fresh
//! dispatchers, which are just a borrowed client reference plus the
//! accumulated prefix.
//!
//! [`AsyncDispatcher`] is the same forwarding contract with the eventual
//! namespace prefixed by the literal `Async.`, which tells the remote API to
//! run the method as a background task. The client adds no polling logic;
//! fetching the task's result is a separate namespace call.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use xapi_client::ClientBuilder;
//! # async fn example() -> xapi_core::Result<()> {
//! let client = ClientBuilder::new("ws://host/").build()?;
//!
//! // VM.get_all
//! let vms = client.namespace("VM").call("get_all", vec![]).await?;
//!
//! // Async.VM.clone -> task reference
//! let task = client
//!     .async_()
//!     .namespace("VM")
//!     .call("clone", vec![])
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::Client;
use serde_json::Value;
use xapi_core::Result;

/// Accumulates namespace segments and forwards the leaf call to the client
///
/// Cheap to construct and immutable; extending the chain returns a new
/// dispatcher rather than mutating this one.
pub struct Dispatcher<'a> {
    client: &'a Client,
    prefix: String,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(client: &'a Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    /// Extend the namespace chain by one segment
    pub fn namespace(&self, segment: &str) -> Dispatcher<'a> {
        Dispatcher::new(self.client, format!("{}.{}", self.prefix, segment))
    }

    /// The namespace prefix accumulated so far
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Invoke the leaf method under the accumulated namespace
    ///
    /// Joins the prefix and `method` with `.` and forwards to the client's
    /// call operation, which injects the session token and applies the
    /// retry policy.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .call(&format!("{}.{}", self.prefix, method), args)
            .await
    }
}

/// Dispatcher variant for asynchronous call framing
///
/// Every namespace step produces a [`Dispatcher`] whose prefix starts with
/// the literal `Async.`. The resulting calls go through the same client
/// call operation as synchronous ones; the prefix alone signals the
/// asynchronous semantics to the remote API.
pub struct AsyncDispatcher<'a> {
    client: &'a Client,
}

impl<'a> AsyncDispatcher<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Start an `Async.`-prefixed namespace chain
    pub fn namespace(&self, segment: &str) -> Dispatcher<'a> {
        Dispatcher::new(self.client, format!("Async.{segment}"))
    }
}
