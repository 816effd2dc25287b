//! Server builder for the WebSocket transport
//!
//! Collects the bind address, the registry, the dispatcher policy, an
//! optional authenticator and observability settings, then binds the
//! listener.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jreg_server::{from_fn, BearerToken, JregServer, MethodOptions};
//! use std::sync::Arc;
//!
//! # async fn example() -> jreg_core::Result<()> {
//! let addr: std::net::SocketAddr = "127.0.0.1:8080".parse().unwrap();
//! let server = JregServer::builder()
//!     .bind(addr)
//!     .method(
//!         "jsonrpc.test(String) -> String",
//!         from_fn(|_ctx, params| async move { Ok(params.get(0, "a").cloned().unwrap_or_default()) }),
//!         MethodOptions::new().safe(),
//!     )
//!     .authenticator(Arc::new(BearerToken::new("s3cret")))
//!     .with_introspection()
//!     .with_default_observability()
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::auth::Authenticator;
use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::handler::Handler;
use crate::registry::{MethodOptions, Registry};
use crate::{JregServer, ServerMetrics};
use jreg_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for [`JregServer`]
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    registry: Registry,
    registration_error: Option<Error>,
    config: DispatcherConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
    observability_config: Option<jreg_core::ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            addr: None,
            registry: Registry::new(),
            registration_error: None,
            config: DispatcherConfig::default(),
            authenticator: None,
            observability_config: None,
            service_name: None,
        }
    }

    /// Set the bind address for the server
    pub fn bind(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Set the bind address from a string (e.g., "127.0.0.1:8080")
    pub fn bind_str(mut self, addr: &str) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::Usage(format!("Invalid address: {}", e)))?;
        self.addr = Some(addr);
        Ok(self)
    }

    /// Register a method; signature errors surface from `build()`
    pub fn method(mut self, signature: &str, handler: Arc<dyn Handler>, options: MethodOptions) -> Self {
        if self.registration_error.is_none() {
            if let Err(e) = self.registry.register(signature, handler, options) {
                self.registration_error = Some(e);
            }
        }
        self
    }

    /// Use a prepared registry (replaces any previously registered methods)
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the whole dispatcher policy
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Require authentication for every method not marked `safe`
    pub fn require_authentication(mut self) -> Self {
        self.config.require_authentication = true;
        self
    }

    /// Keep internal error details off the wire
    pub fn redact_internal_errors(mut self) -> Self {
        self.config.redact_internal_errors = true;
        self
    }

    /// Serve `system.describe`
    pub fn with_introspection(mut self) -> Self {
        self.config.introspection = true;
        self
    }

    /// Authenticate connections at the WebSocket handshake
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: jreg_core::ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(jreg_core::ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Bind the listener and assemble the server
    ///
    /// # Errors
    ///
    /// - the first signature error from [`ServerBuilder::method`]
    /// - `Error::Usage` without a bind address
    /// - `Error::Transport` if the address cannot be bound
    pub async fn build(self) -> Result<JregServer> {
        if let Some(e) = self.registration_error {
            return Err(e);
        }

        let addr = self
            .addr
            .ok_or_else(|| Error::Usage("No bind address specified".to_string()))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            jreg_core::init_observability(config.clone())
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ServerMetrics::new(config.service_name.clone())))
        } else {
            None
        };

        let mut dispatcher = Dispatcher::new(self.registry, self.config);
        if let Some(ref m) = metrics {
            dispatcher = dispatcher.with_metrics(Arc::clone(m));
        }

        tracing::info!(
            addr = %addr,
            methods = dispatcher.registry().len(),
            "Server listening"
        );

        Ok(JregServer {
            listener,
            dispatcher,
            authenticator: self.authenticator,
            metrics,
            active_connections: Arc::new(AtomicI64::new(0)),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
