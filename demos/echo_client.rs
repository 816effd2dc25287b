//! Echo client demo
//!
//! Calls the methods served by `echo_server` with both protocol versions.
//!
//! Run with: cargo run --example echo_client

use jreg_client::{ServiceProxy, WsTransport};
use jreg_core::{Error, Params, Version};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let url = "ws://127.0.0.1:9010";
    let transport = Arc::new(WsTransport::connect_with_token(url, "s3cret").await?);

    let v1 = ServiceProxy::new(transport.clone(), Version::V1);
    let v2 = ServiceProxy::new(transport.clone(), Version::V2);

    let hello = v1.call("jsonrpc.test", vec![json!("Hello")]).await?;
    println!("jsonrpc.test (1.0): {}", hello);

    let named: Params = serde_json::from_value(json!({"string": "omg", "string2": "wtf"}))?;
    let joined: String = v2.call_as("jsonrpc.checkedEcho", named.clone()).await?;
    println!("jsonrpc.checkedEcho (2.0, named): {}", joined);

    match v1.call("jsonrpc.checkedEcho", named).await {
        Err(Error::Usage(msg)) => println!("1.0 with keyword args refused: {}", msg),
        other => println!("unexpected: {:?}", other),
    }

    match v2.call("jsonrpc.checkedEcho", vec![json!(["omg"]), json!(["wtf"])]).await {
        Err(Error::JsonRpc(err)) => println!("wrong types rejected: {}", err),
        other => println!("unexpected: {:?}", other),
    }

    let secret = v2.call("jsonrpc.testAuth", vec![json!("authenticated")]).await?;
    println!("jsonrpc.testAuth: {}", secret);

    v2.notify("jsonrpc.test", vec![json!("nobody listens")]).await?;

    let methods = v2.call("system.describe", Params::default()).await?;
    println!("Methods: {}", serde_json::to_string_pretty(&methods)?);

    transport.close().await?;
    Ok(())
}
