//! Proxy round trips through an in-process dispatcher

use jreg_client::{transport, ServiceProxy};
use jreg_core::{Error, Params, Version};
use jreg_server::{from_fn, from_typed_fn, Dispatcher, DispatcherConfig, MethodOptions, Registry};
use serde_json::{json, Value};
use std::sync::Arc;

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register(
            "jsonrpc.test",
            from_fn(|_ctx, params| async move {
                params
                    .get(0, "string")
                    .cloned()
                    .ok_or_else(|| Error::InvalidParams("missing `string`".into()))
            }),
            MethodOptions::new().params(["string"]),
        )
        .unwrap();
    registry
        .register(
            "jsonrpc.checkedEcho(string=str, string2=str) -> str",
            from_typed_fn(|_ctx, (a, b): (String, String)| async move { Ok(a + &b) }),
            MethodOptions::new().validate(),
        )
        .unwrap();
    registry
        .register(
            "jsonrpc.testAuth",
            from_fn(|_ctx, _params| async move { Ok(json!("secret")) }),
            MethodOptions::new().authenticated(),
        )
        .unwrap();
    registry
}

/// A proxy whose transport feeds the dispatcher directly
fn testing_proxy(version: Version, authenticated: bool) -> ServiceProxy {
    let dispatcher = Dispatcher::new(registry(), DispatcherConfig::default());
    let transport = transport::from_fn(move |body: Vec<u8>| {
        let dispatcher = dispatcher.clone();
        async move { Ok(dispatcher.dispatch(&body, authenticated).await) }
    });
    ServiceProxy::new(transport, version)
}

fn named(value: Value) -> Params {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_positional_args() {
    let proxy = testing_proxy(Version::V1, false);
    let result = proxy.call("jsonrpc.test", vec![json!("Hello")]).await.unwrap();
    assert_eq!(result, json!("Hello"));

    let err = proxy
        .call("jsonrpc.test", named(json!({"string": "Hello"})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
}

#[tokio::test]
async fn test_keyword_args() {
    let proxy = testing_proxy(Version::V2, false);
    let result: String = proxy
        .call_as("jsonrpc.test", named(json!({"string": "Hello"})))
        .await
        .unwrap();
    assert_eq!(result, "Hello");
}

#[tokio::test]
async fn test_server_errors_surface_unchanged() {
    let proxy = testing_proxy(Version::V2, false);

    match proxy.call("jsonrpc.nowai", Params::default()).await {
        Err(Error::JsonRpc(data)) => assert_eq!(data.code, -32601),
        other => panic!("Expected method not found, got {:?}", other),
    }

    match proxy.call("jsonrpc.checkedEcho", vec![json!(1), json!(2)]).await {
        Err(Error::JsonRpc(data)) => assert_eq!(data.code, -32602),
        other => panic!("Expected invalid params, got {:?}", other),
    }

    match proxy.call("jsonrpc.testAuth", Params::default()).await {
        Err(Error::JsonRpc(data)) => {
            assert_eq!(data.code, 401);
            assert_eq!(data.data, Some(json!({"method": "jsonrpc.testAuth"})));
        }
        other => panic!("Expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_authenticated_transport() {
    let proxy = testing_proxy(Version::V1, true);
    let result = proxy.call("jsonrpc.testAuth", Params::default()).await.unwrap();
    assert_eq!(result, json!("secret"));
}

#[tokio::test]
async fn test_checked_echo_roundtrip() {
    let proxy = testing_proxy(Version::V2, false);
    let result: String = proxy
        .call_as("jsonrpc.checkedEcho", vec![json!("omg"), json!("wtf")])
        .await
        .unwrap();
    assert_eq!(result, "omgwtf");
}

#[tokio::test]
async fn test_notify_through_dispatcher() {
    let proxy = testing_proxy(Version::V2, false);
    proxy.notify("jsonrpc.test", vec![json!("ignored")]).await.unwrap();
}

#[tokio::test]
async fn test_proxy_shared_across_tasks() {
    let proxy = Arc::new(testing_proxy(Version::V2, false));
    let mut tasks = Vec::new();
    for i in 0..8 {
        let proxy = Arc::clone(&proxy);
        tasks.push(tokio::spawn(async move {
            proxy.call("jsonrpc.test", vec![json!(i)]).await.unwrap()
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap(), json!(i));
    }
}
