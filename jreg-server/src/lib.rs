//! JSON-RPC method registry, validator and dispatcher
//!
//! Application code registers handlers under compact signature strings;
//! the dispatcher then serves JSON-RPC 1.0 and 2.0 request bodies against
//! them, enforcing authentication and (optionally) argument and return types.
//!
//! # Core Pieces
//!
//! - **Registry**: signature → handler map, built at startup
//! - **Validator**: checks params and results against signatures
//! - **Dispatcher**: body in, body out; never lets an error escape
//! - **WebSocket transport**: `JregServer`, one dispatcher shared by every
//!   connection, with handshake-time authentication
//!
//! The dispatcher does not care how bytes arrive. `Dispatcher::dispatch` can
//! sit behind any transport; `JregServer` is the one shipped here.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jreg_server::{from_typed_fn, JregServer, MethodOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let addr: std::net::SocketAddr = "127.0.0.1:8080".parse()?;
//!     let server = JregServer::builder()
//!         .bind(addr)
//!         .method(
//!             "jsonrpc.strangeEcho",
//!             from_typed_fn(|_ctx, args: (String, String, String, String, String)| async move {
//!                 Ok(vec![args.0, args.1, args.2, args.3, args.4])
//!             }),
//!             MethodOptions::new().params(["string", "omg", "wtf", "nowai", "yeswai"]),
//!         )
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The accept loop spawns a task per connection. Each connection holds a
//! clone of the dispatcher, which shares the immutable registry through an
//! `Arc`; requests never contend on a lock.

mod auth;
mod builder;
mod connection;
mod dispatcher;
mod handler;
mod metrics;
mod registry;
mod validate;

pub use auth::{authenticator_fn, Authenticator, BearerToken, FnAuthenticator};
pub use builder::ServerBuilder;
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherConfig, Reply, DESCRIBE_METHOD};
pub use handler::{from_fn, from_typed_fn, FnHandler, Handler, HandlerResult, RequestContext};
pub use metrics::ServerMetrics;
pub use registry::{MethodOptions, RegisteredMethod, Registry, RegistryBuilder};
pub use validate::{validate_params, validate_return};

use jreg_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// JSON-RPC server over WebSocket
///
/// # Lifecycle
///
/// 1. **Build**: `JregServer::builder()`, register methods, `build().await`
/// 2. **Run**: `server.run().await` accepts connections until the listener
///    fails or the task is dropped
pub struct JregServer {
    listener: TcpListener,
    dispatcher: Dispatcher,
    authenticator: Option<Arc<dyn Authenticator>>,
    metrics: Option<Arc<ServerMetrics>>,
    active_connections: Arc<AtomicI64>,
}

impl JregServer {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Error::Transport(e.to_string()))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Accept connections and serve each in its own task
    ///
    /// # Errors
    ///
    /// `Error::Transport` if accepting a TCP connection fails.
    #[tracing::instrument(skip(self), name = "server.run")]
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting jreg server");
        let conn_counter = AtomicU64::new(0);

        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| Error::Transport(e.to_string()))?;
            let conn_id = conn_counter.fetch_add(1, Ordering::SeqCst);
            let dispatcher = self.dispatcher.clone();
            let authenticator = self.authenticator.clone();
            let metrics = self.metrics.clone();
            let active = Arc::clone(&self.active_connections);

            tracing::info!(conn_id = conn_id, addr = %addr, "New connection accepted");

            tokio::spawn(async move {
                if let Err(e) = connection::handle_connection(
                    stream,
                    conn_id,
                    dispatcher,
                    authenticator,
                    metrics,
                    active,
                )
                .await
                {
                    tracing::error!(conn_id = conn_id, error = %e, "Connection error");
                }
            });
        }
    }
}
