//! Echo server demo
//!
//! Registers the classic echo methods and serves them over WebSocket.
//! Connections presenting `Authorization: Bearer s3cret` are authenticated.
//!
//! Run with: cargo run --example echo_server

use jreg_core::{Error, ObservabilityConfig, Params};
use jreg_server::{from_fn, from_typed_fn, BearerToken, MethodOptions, ServerBuilder};
use serde_json::{json, Value};
use std::sync::Arc;

async fn echo(params: Params) -> jreg_core::Result<Value> {
    tracing::info!(params = params.len(), "Echoing");
    params
        .get(0, "string")
        .cloned()
        .ok_or_else(|| Error::InvalidParams("missing `string`".to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ObservabilityConfig::new("jreg-echo-server").with_log_level("debug");

    let addr: std::net::SocketAddr = "127.0.0.1:9010".parse()?;
    let server = ServerBuilder::new()
        .bind(addr)
        .method(
            "jsonrpc.test",
            from_fn(|_ctx, params| echo(params)),
            MethodOptions::new().params(["string"]),
        )
        .method(
            "jsonrpc.testAuth",
            from_fn(|_ctx, params| echo(params)),
            MethodOptions::new().authenticated().params(["string"]),
        )
        .method(
            "jsonrpc.safeEcho",
            from_fn(|_ctx, params| echo(params)),
            MethodOptions::new().safe().params(["string"]),
        )
        .method(
            "jsonrpc.checkedEcho(string=str, string2=str) -> str",
            from_typed_fn(|_ctx, (a, b): (String, String)| async move { Ok(a + &b) }),
            MethodOptions::new().safe().validate(),
        )
        .method(
            "jsonrpc.authCheckedEcho(Object, Array) -> Object",
            from_typed_fn(|_ctx, (obj1, arr1): (Value, Value)| async move {
                Ok(json!({"obj1": obj1, "arr1": arr1}))
            }),
            MethodOptions::new().validate().params(["obj1", "arr1"]),
        )
        .method(
            "jsonrpc.tuple() -> Array",
            from_fn(|_ctx, _params| async { Ok(json!([1, 0])) }),
            MethodOptions::new().validate(),
        )
        .authenticator(Arc::new(BearerToken::new("s3cret")))
        .with_introspection()
        .with_observability(config)
        .build()
        .await?;

    println!("Echo server running on 127.0.0.1:9010");
    println!("Try: cargo run --example echo_client");

    server.run().await?;

    jreg_core::shutdown_observability();
    Ok(())
}
