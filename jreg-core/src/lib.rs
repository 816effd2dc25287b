//! Core types for jreg, a JSON-RPC method registry and dispatcher
//!
//! This crate holds everything that both sides of a JSON-RPC conversation
//! need and that does not depend on how methods are executed:
//!
//! - **Types**: 1.0/2.0 request and response envelopes, ids, call params
//! - **Codec**: decoding raw bodies into envelopes and back
//! - **Kind**: the abstract type system used by method signatures
//! - **Signature**: the parser for compact method signature strings
//! - **Error handling**: the closed error taxonomy and its wire mapping
//! - **Observability**: `tracing` subscriber and OpenTelemetry setup
//!
//! The `jreg-server` crate builds the registry and dispatcher on top of this,
//! and `jreg-client` the calling side.
//!
//! # Example
//!
//! ```rust
//! use jreg_core::{parse_signature, Kind};
//! use serde_json::json;
//!
//! let sig = parse_signature("jsonrpc.checkedEcho(string=str, string2=str) -> str", &[] as &[&str]).unwrap();
//! assert_eq!(sig.param_names(), vec!["string", "string2"]);
//! assert!(sig.params()[0].kind.matches(&json!("omg")));
//! assert_eq!(sig.returns(), Kind::String);
//! ```

pub mod codec;
pub mod error;
pub mod kind;
pub mod observability;
pub mod signature;
pub mod types;

pub use error::{code, Error, JsonRpcErrorData, Result};
pub use kind::Kind;
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use signature::{parse_signature, MethodSignature, Param};
pub use types::{Id, JsonRpcRequest, JsonRpcResponse, Params, Version};
