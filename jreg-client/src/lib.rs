//! JSON-RPC 1.0/2.0 client for jreg services
//!
//! [`ServiceProxy`] turns method calls into request envelopes and response
//! envelopes back into `Result`s. It is transport-agnostic: bodies travel
//! through any [`Transport`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jreg_client::{ServiceProxy, WsTransport};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = WsTransport::connect_with_token("ws://localhost:8080", "s3cret").await?;
//!     let proxy = ServiceProxy::v2(Arc::new(transport));
//!
//!     let echoed: String = proxy.call_as("jsonrpc.test", vec![json!("Hello")]).await?;
//!     println!("Result: {}", echoed);
//!
//!     proxy.notify("jsonrpc.notify", vec![json!("fire and forget")]).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Testing Against a Dispatcher
//!
//! A closure transport can hand bodies straight to a `jreg_server::Dispatcher`,
//! skipping the network entirely:
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//! let proxy = ServiceProxy::v2(transport::from_fn(move |body| {
//!     let dispatcher = dispatcher.clone();
//!     async move { Ok(dispatcher.dispatch(&body, true).await) }
//! }));
//! ```

mod proxy;
pub mod transport;

pub use proxy::ServiceProxy;
pub use transport::{FnTransport, Transport, WsTransport};
