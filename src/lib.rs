//! jreg - a JSON-RPC 1.0/2.0 method registry and dispatcher
//!
//! Convenience crate re-exporting the jreg sub-crates, for users who want a
//! single dependency for both sides.
//!
//! # Architecture
//!
//! - **jreg-core**: envelopes, codec, type system, signature parser, errors,
//!   observability setup
//! - **jreg-server**: registry, validator, dispatcher, WebSocket transport
//! - **jreg-client**: service proxy and transports
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use jreg::server::{from_fn, MethodOptions};
//! use jreg::JregServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let addr: std::net::SocketAddr = "127.0.0.1:8080".parse()?;
//!     let server = JregServer::builder()
//!         .bind(addr)
//!         .method(
//!             "jsonrpc.test",
//!             from_fn(|_ctx, params| async move { Ok(params.get(0, "string").cloned().unwrap_or_default()) }),
//!             MethodOptions::new().params(["string"]),
//!         )
//!         .build()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use jreg::client::WsTransport;
//! use jreg::ServiceProxy;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let proxy = ServiceProxy::v2(Arc::new(WsTransport::connect("ws://localhost:8080").await?));
//!     let result = proxy.call("jsonrpc.test", vec![serde_json::json!("Hello")]).await?;
//!     println!("Result: {}", result);
//!     Ok(())
//! }
//! ```

pub use jreg_client as client;
pub use jreg_core as core;
pub use jreg_server as server;

pub use jreg_client::ServiceProxy;
pub use jreg_core::{parse_signature, Error, Kind, Params, Result, Version};
pub use jreg_server::{Dispatcher, DispatcherConfig, JregServer, Registry};
