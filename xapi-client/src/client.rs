//! Session-managing RPC client
//!
//! This module provides the main `Client` type, which owns the session
//! lifecycle and is the single entry point for every remote call. It
//! handles:
//!
//! - session token acquisition, injection, and renewal
//! - replaying the last successful login when the server invalidates the
//!   session, then retrying the interrupted call exactly once
//! - bounded reconnect-and-retry on transient connection loss
//! - the namespace-first call surface (`client.namespace("VM")...`)
//!
//! # Session Lifecycle
//!
//! 1. **Login**: `login_with_password` (or any `login` variant) stores the
//!    session token and the login call for later replay
//! 2. **Calls**: every non-login call carries the token as its first
//!    positional argument
//! 3. **Renewal**: a `SESSION_INVALID` failure triggers one relogin and one
//!    retry, invisible to the caller on success
//! 4. **Logout**: `logout` releases the session server-side
//!
//! # Thread Safety
//!
//! The client is `Send + Sync`, but it owns a single logical session. Token
//! renewal is not atomic with respect to concurrent in-flight calls, so
//! concurrent callers sharing one client risk racing a relogin against a
//! call still holding the stale token. Use one client per caller, or add
//! external synchronization.

use crate::backoff::ReconnectPolicy;
use crate::dispatcher::{AsyncDispatcher, Dispatcher};
use crate::transport::Transport;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use xapi_core::{envelope, Error, Result};

/// Post-login hook signature
///
/// Invoked with the client reference after every successful login and
/// relogin. Callers use this to re-establish per-session server state
/// (event subscriptions, for example) that a fresh session loses. A hook
/// error aborts the in-progress login and propagates unchanged.
pub type AfterLoginHook =
    Box<dyn for<'a> Fn(&'a Client) -> BoxFuture<'a, Result<()>> + Send + Sync>;

/// The last successful login call, kept for replay after invalidation
#[derive(Clone)]
struct LoginCall {
    method: String,
    args: Vec<Value>,
}

/// Session-managing client for a namespaced hypervisor API
///
/// Construct with [`ClientBuilder`](crate::ClientBuilder). All remote calls
/// go through [`Client::call`], usually via a namespace chain started with
/// [`Client::namespace`] or one of the typed accessors.
pub struct Client {
    transport: Arc<dyn Transport>,
    session: RwLock<Option<String>>,
    login_call: Mutex<Option<LoginCall>>,
    after_login: Mutex<Option<Arc<AfterLoginHook>>>,
    reconnect_policy: Box<dyn ReconnectPolicy>,
}

impl Client {
    pub(crate) fn from_parts(
        transport: Arc<dyn Transport>,
        reconnect_policy: Box<dyn ReconnectPolicy>,
    ) -> Self {
        Self {
            transport,
            session: RwLock::new(None),
            login_call: Mutex::new(None),
            after_login: Mutex::new(None),
            reconnect_policy,
        }
    }

    /// Authenticate with the named login variant
    ///
    /// Login methods live in the `session` namespace on the wire and are
    /// not namespace-chained: `login("login_with_password", args)` calls
    /// `session.login_with_password`. On success the returned token becomes
    /// the session, the call is recorded for relogin, and the post-login
    /// hook (if any) runs with the client reference.
    #[tracing::instrument(skip(self, args), fields(method = method))]
    pub async fn login(&self, method: &str, args: Vec<Value>) -> Result<()> {
        let token = self.acquire_session(method, &args).await?;
        *self.session.write().await = Some(token);
        *self.login_call.lock().await = Some(LoginCall {
            method: method.to_string(),
            args,
        });
        self.run_after_login().await?;
        tracing::info!("Logged in");
        Ok(())
    }

    /// Authenticate with username and password
    pub async fn login_with_password(&self, username: &str, password: &str) -> Result<()> {
        self.login(
            "login_with_password",
            vec![Value::from(username), Value::from(password)],
        )
        .await
    }

    /// Authenticate with username, password, and a client API version string
    pub async fn login_with_password_version(
        &self,
        username: &str,
        password: &str,
        version: &str,
    ) -> Result<()> {
        self.login(
            "login_with_password",
            vec![
                Value::from(username),
                Value::from(password),
                Value::from(version),
            ],
        )
        .await
    }

    /// Release the current session server-side
    ///
    /// The recorded login call is kept, so a later call can still trigger
    /// an automatic relogin.
    pub async fn logout(&self) -> Result<()> {
        self.call("session.logout", vec![]).await?;
        self.session.write().await.take();
        tracing::info!("Logged out");
        Ok(())
    }

    /// Register the post-login hook
    ///
    /// The hook runs after every successful login and relogin, always with
    /// the client as its argument. Registering replaces any previous hook.
    pub async fn after_login(&self, hook: AfterLoginHook) {
        *self.after_login.lock().await = Some(Arc::new(hook));
    }

    /// The current session token, if logged in
    ///
    /// Read-only accessor for diagnostics and tests.
    pub async fn session_token(&self) -> Option<String> {
        self.session.read().await.clone()
    }

    /// Start a namespace chain for the generic call path
    ///
    /// The segment becomes the first component of the wire method name. An
    /// `async` segment (case-insensitive) routes the chain through the
    /// `Async.` prefix, same as [`Client::async_`]. Login variants do not
    /// chain; use [`Client::login`] for those.
    pub fn namespace(&self, segment: &str) -> Dispatcher<'_> {
        if segment.eq_ignore_ascii_case("async") {
            return Dispatcher::new(self, "Async");
        }
        Dispatcher::new(self, segment)
    }

    /// Start an asynchronous call chain
    ///
    /// Calls built from the returned dispatcher carry the `Async.` prefix,
    /// which makes the remote execute the method as a background task and
    /// return a task reference instead of the result.
    pub fn async_(&self) -> AsyncDispatcher<'_> {
        AsyncDispatcher::new(self)
    }

    /// Invoke a fully qualified method
    ///
    /// This is the call operation every dispatcher chain lands on. The
    /// current session token (if any) is prepended to `args`, and two
    /// recoveries are applied in-line:
    ///
    /// - a session-invalid failure clears the token, replays the recorded
    ///   login, and retries the call exactly once; without a recorded login
    ///   this fails fast with [`Error::LoginRequired`]
    /// - a connection reset discards the cached connection and retries with
    ///   the configured bounded backoff
    ///
    /// Everything else propagates unchanged.
    #[tracing::instrument(skip(self, args), fields(method = method))]
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let mut relogged_in = false;
        loop {
            let params = self.with_session(&args).await;
            match self.call_raw(method, &params).await {
                Ok(value) => return Ok(value),
                Err(Error::SessionInvalid) if !relogged_in => {
                    relogged_in = true;
                    self.session.write().await.take();
                    tracing::debug!("Session invalidated, replaying login");
                    self.relogin().await?;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Prepend the session token to the argument list, if one exists
    async fn with_session(&self, args: &[Value]) -> Vec<Value> {
        let session = self.session.read().await;
        let mut params = Vec::with_capacity(args.len() + 1);
        if let Some(token) = session.as_deref() {
            params.push(Value::from(token));
        }
        params.extend_from_slice(args);
        params
    }

    /// One round trip with the reconnect-retry policy, no session handling
    async fn call_raw(&self, method: &str, params: &[Value]) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            match self.do_call(method, params).await {
                Err(Error::ConnectionReset) => match self.reconnect_policy.delay_for(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            "Connection reset, retrying"
                        );
                        self.transport.reset().await;
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        tracing::error!(attempt, "Giving up after repeated connection resets");
                        return Err(Error::ConnectionReset);
                    }
                },
                other => return other,
            }
        }
    }

    /// One transport round trip plus envelope interpretation
    async fn do_call(&self, method: &str, params: &[Value]) -> Result<Value> {
        let raw = self.transport.round_trip(method, params).await?;
        envelope::interpret(raw)
    }

    /// Perform a `session.<method>` call and return the fresh token
    async fn acquire_session(&self, method: &str, args: &[Value]) -> Result<String> {
        let wire_method = format!("session.{method}");
        let value = self.call_raw(&wire_method, args).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                Error::ProtocolViolation("login did not return a session token".to_string())
            })
    }

    /// Replay the recorded login after session invalidation
    async fn relogin(&self) -> Result<()> {
        let login_call = self
            .login_call
            .lock()
            .await
            .clone()
            .ok_or(Error::LoginRequired)?;
        tracing::info!(method = %login_call.method, "Replaying login");
        let token = self
            .acquire_session(&login_call.method, &login_call.args)
            .await?;
        *self.session.write().await = Some(token);
        self.run_after_login().await
    }

    async fn run_after_login(&self) -> Result<()> {
        // The guard must not be held across the hook await: a hook that
        // calls back into the client can hit SESSION_INVALID and drive a
        // relogin, which runs the hook again on the same task.
        let hook = self.after_login.lock().await.clone();
        if let Some(hook) = hook {
            hook(self).await?;
        }
        Ok(())
    }
}

// Typed convenience accessors for the common namespaces. The generic
// `namespace` path stays available for everything else; the remote method
// surface is not fixed at compile time.
impl Client {
    /// `VM` namespace
    pub fn vm(&self) -> Dispatcher<'_> {
        self.namespace("VM")
    }

    /// `host` namespace
    pub fn host(&self) -> Dispatcher<'_> {
        self.namespace("host")
    }

    /// `pool` namespace
    pub fn pool(&self) -> Dispatcher<'_> {
        self.namespace("pool")
    }

    /// `SR` namespace (storage repositories)
    pub fn sr(&self) -> Dispatcher<'_> {
        self.namespace("SR")
    }

    /// `VBD` namespace (virtual block devices)
    pub fn vbd(&self) -> Dispatcher<'_> {
        self.namespace("VBD")
    }

    /// `VDI` namespace (virtual disk images)
    pub fn vdi(&self) -> Dispatcher<'_> {
        self.namespace("VDI")
    }

    /// `network` namespace
    pub fn network(&self) -> Dispatcher<'_> {
        self.namespace("network")
    }

    /// `PIF` namespace (physical interfaces)
    pub fn pif(&self) -> Dispatcher<'_> {
        self.namespace("PIF")
    }

    /// `task` namespace
    pub fn task(&self) -> Dispatcher<'_> {
        self.namespace("task")
    }

    /// `event` namespace
    pub fn event(&self) -> Dispatcher<'_> {
        self.namespace("event")
    }

    /// `session` namespace
    ///
    /// For non-login session methods (`get_all_subject_identifiers` and
    /// friends); the login variants themselves go through [`Client::login`].
    pub fn session(&self) -> Dispatcher<'_> {
        self.namespace("session")
    }
}
