//! Client builder for configuring the endpoint, timeout, and retry policy
//!
//! The `ClientBuilder` provides a fluent API for configuring client behavior.
//! It allows you to:
//! - Set the endpoint address (an empty path component is normalized to `/`)
//! - Bound each round trip with a timeout
//! - Choose the reconnect retry policy
//! - Inject a custom transport (used by tests and alternate wire formats)
//!
//! # Examples
//!
//! ```rust,no_run
//! use xapi_client::{ClientBuilder, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # fn example() -> xapi_core::Result<()> {
//! let client = ClientBuilder::new("ws://pool-master.example:80")
//!     .timeout(Duration::from_secs(30))
//!     .with_reconnect_policy(Box::new(
//!         ExponentialBackoff::default().with_max_attempts(5)
//!     ))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::backoff::{ExponentialBackoff, NoRetry, ReconnectPolicy};
use crate::client::Client;
use crate::transport::{Transport, WsTransport};
use std::sync::Arc;
use std::time::Duration;
use xapi_core::{Error, Result};

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder {
    endpoint: String,
    timeout: Option<Duration>,
    reconnect_policy: Option<Box<dyn ReconnectPolicy>>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new client builder for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: None,
            reconnect_policy: None,
            transport: None,
        }
    }

    /// Bound each round trip with a timeout
    ///
    /// Without this, a round trip waits as long as the connection lives.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom reconnect retry policy
    ///
    /// The default is exponential backoff with jitter, capped at 3 attempts.
    pub fn with_reconnect_policy(mut self, policy: Box<dyn ReconnectPolicy>) -> Self {
        self.reconnect_policy = Some(policy);
        self
    }

    /// Fail on the first connection reset instead of retrying
    pub fn no_reconnect(mut self) -> Self {
        self.reconnect_policy = Some(Box::new(NoRetry));
        self
    }

    /// Use a custom transport instead of the default WebSocket one
    ///
    /// The endpoint is ignored when a transport is supplied.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client
    ///
    /// Synchronous: the default transport connects lazily on the first call.
    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let endpoint = normalize_endpoint(&self.endpoint)?;
                Arc::new(WsTransport::new(endpoint, self.timeout))
            }
        };
        let policy = self
            .reconnect_policy
            .unwrap_or_else(|| Box::new(ExponentialBackoff::default()));
        Ok(Client::from_parts(transport, policy))
    }
}

/// Normalize an endpoint address
///
/// Requires a scheme, and normalizes a present-but-empty path component to
/// `/` so `ws://host:80` and `ws://host:80/` address the same endpoint.
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let Some((scheme, rest)) = endpoint.split_once("://") else {
        return Err(Error::InvalidEndpoint(format!(
            "missing scheme in {endpoint:?}"
        )));
    };
    if scheme.is_empty() || rest.is_empty() {
        return Err(Error::InvalidEndpoint(endpoint.to_string()));
    }
    if rest.contains('/') {
        Ok(endpoint.to_string())
    } else {
        Ok(format!("{endpoint}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = ClientBuilder::new("ws://localhost:8080");
        assert_eq!(builder.endpoint, "ws://localhost:8080");
        assert!(builder.timeout.is_none());
        assert!(builder.reconnect_policy.is_none());
        assert!(builder.transport.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let builder = ClientBuilder::new("ws://localhost:8080")
            .timeout(Duration::from_secs(10))
            .no_reconnect();

        assert_eq!(builder.timeout, Some(Duration::from_secs(10)));
        assert!(builder.reconnect_policy.is_some());
    }

    #[test]
    fn test_build_with_default_policy() {
        let client = ClientBuilder::new("ws://localhost:8080").build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_path_is_normalized() {
        assert_eq!(
            normalize_endpoint("ws://host:80").unwrap(),
            "ws://host:80/"
        );
    }

    #[test]
    fn test_existing_path_is_kept() {
        assert_eq!(
            normalize_endpoint("ws://host:80/").unwrap(),
            "ws://host:80/"
        );
        assert_eq!(
            normalize_endpoint("ws://host/jsonrpc").unwrap(),
            "ws://host/jsonrpc"
        );
    }

    #[test]
    fn test_missing_scheme_is_rejected() {
        assert!(matches!(
            normalize_endpoint("host:80"),
            Err(Error::InvalidEndpoint(_))
        ));
        assert!(matches!(
            normalize_endpoint("ws://"),
            Err(Error::InvalidEndpoint(_))
        ));
    }
}
