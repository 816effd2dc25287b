//! Shared fixtures for jreg-server integration tests
//!
//! `test_registry` registers the classic echo service used across the
//! suites: plain echoes, authenticated and safe variants, checked signatures
//! and a handler that always fails.

#![allow(dead_code)]

use jreg_core::{Error, Params};
use jreg_server::{from_fn, Dispatcher, DispatcherConfig, MethodOptions, Registry};
use serde_json::{json, Value};

fn arg(params: &Params, position: usize, name: &str) -> Result<Value, Error> {
    params
        .get(position, name)
        .cloned()
        .ok_or_else(|| Error::InvalidParams(format!("missing argument `{}`", name)))
}

fn concat(params: &Params, first: &str, second: &str) -> Result<Value, Error> {
    let a = arg(params, 0, first)?;
    let b = arg(params, 1, second)?;
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => Ok(json!(format!("{}{}", a, b))),
        _ => Err(Error::Internal("cannot concatenate non-strings".to_string())),
    }
}

fn strange_echo(params: &Params) -> Result<Value, Error> {
    let names = ["string", "omg", "wtf", "nowai"];
    let mut values = Vec::with_capacity(5);
    for (position, name) in names.iter().enumerate() {
        values.push(arg(params, position, name)?);
    }
    values.push(params.get(4, "yeswai").cloned().unwrap_or_else(|| json!("Default")));
    Ok(Value::Array(values))
}

pub fn test_registry() -> Registry {
    let mut registry = Registry::new();

    registry
        .register(
            "jsonrpc.test",
            from_fn(|_ctx, params| async move { arg(&params, 0, "string") }),
            MethodOptions::new().params(["string"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.testAuth",
            from_fn(|_ctx, params| async move { arg(&params, 0, "string") }),
            MethodOptions::new().authenticated().params(["string"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.notify",
            from_fn(|_ctx, _params| async move { Ok(Value::Null) }),
            MethodOptions::new().params(["string"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.fails",
            from_fn(|_ctx, params| async move {
                let items: Vec<Value> = Vec::new();
                // always out of range
                Ok(items[params.len()].clone())
            }),
            MethodOptions::new().params(["string"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.strangeEcho",
            from_fn(|_ctx, params| async move { strange_echo(&params) }),
            MethodOptions::new().params(["string", "omg", "wtf", "nowai", "yeswai"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.safeEcho",
            from_fn(|_ctx, params| async move { arg(&params, 0, "string") }),
            MethodOptions::new().safe().params(["string"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.strangeSafeEcho",
            from_fn(|_ctx, params| async move { strange_echo(&params) }),
            MethodOptions::new().safe(),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.checkedEcho(string=str, string2=str) -> str",
            from_fn(|_ctx, params| async move { concat(&params, "string", "string2") }),
            MethodOptions::new().safe().validate(),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.checkedArgsEcho(string=str, string2=str)",
            from_fn(|_ctx, params| async move { concat(&params, "string", "string2") }),
            MethodOptions::new().validate(),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.checkedReturnEcho() -> String",
            from_fn(|_ctx, _params| async move { Ok(json!(["omg", "wtf"])) }),
            MethodOptions::new().validate(),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.authCheckedEcho(Object, Array) -> Object",
            from_fn(|_ctx, params| async move {
                Ok(json!({
                    "obj1": arg(&params, 0, "obj1")?,
                    "arr1": arg(&params, 1, "arr1")?,
                }))
            }),
            MethodOptions::new().validate().params(["obj1", "arr1"]),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.varArgs(String, String, str3=String) -> Array",
            from_fn(|_ctx, params| async move {
                let values = match params {
                    Params::Positional(values) => values,
                    Params::Named(map) => ["a", "b", "str3"]
                        .iter()
                        .filter_map(|name| map.get(*name).cloned())
                        .collect(),
                };
                Ok(Value::Array(values))
            }),
            MethodOptions::new().validate(),
        )
        .unwrap();

    registry
        .register(
            "jsonrpc.tuple() -> Array",
            from_fn(|_ctx, _params| async move { Ok(json!([1, 0])) }),
            MethodOptions::new().validate(),
        )
        .unwrap();

    registry
}

pub fn dispatcher(config: DispatcherConfig) -> Dispatcher {
    Dispatcher::new(test_registry(), config)
}

/// Dispatch a body and parse the reply
pub async fn call(dispatcher: &Dispatcher, body: Value, authenticated: bool) -> Value {
    let body = serde_json::to_vec(&body).unwrap();
    let reply = dispatcher.dispatch(&body, authenticated).await;
    serde_json::from_slice(&reply).unwrap()
}

pub fn v1(method: &str, params: Value) -> Value {
    json!({"method": method, "params": params, "id": "test-id"})
}

pub fn v2(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "method": method, "params": params, "id": "test-id"})
}
