//! Handler traits and types for registered methods
//!
//! A handler is the callable half of a registered method. It receives the
//! per-request [`RequestContext`] and the call's [`Params`], already checked
//! against the method signature when validation is enabled, and produces a
//! JSON result.
//!
//! Params arrive in the shape the caller used: `Params::Positional` for
//! arrays, bound in declared order, and `Params::Named` for objects, bound by
//! keyword. [`Params::get`] covers both. Typed handlers built with
//! [`from_typed_fn`] take either shape: a keyword call is reordered into the
//! method's declared argument order when the handler wants a tuple.
//!
//! # Creating Handlers
//!
//! - [`from_fn`]: wrap an async closure over raw context and params
//! - [`from_typed_fn`]: deserialize params into a tuple or struct first
//!
//! ```rust
//! use jreg_server::{from_fn, from_typed_fn};
//! use jreg_core::Error;
//! use serde_json::{json, Value};
//!
//! let echo = from_fn(|_ctx, params| async move {
//!     params
//!         .get(0, "string")
//!         .cloned()
//!         .ok_or_else(|| Error::InvalidParams("missing `string`".into()))
//! });
//!
//! let concat = from_typed_fn(|_ctx, (a, b): (String, String)| async move {
//!     Ok(a + &b)
//! });
//! ```

use jreg_core::{Error, Id, Params, Result, Version};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by handlers
pub type HandlerResult = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// What a handler knows about the request it is serving
///
/// Built fresh for every request and never shared between requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Name of the method being called
    pub method: String,
    /// Id from the request, `None` when absent
    pub id: Option<Id>,
    /// Protocol dialect of the request
    pub version: Version,
    /// Whether the transport vouched for the caller
    pub authenticated: bool,
    /// The method's declared argument order, empty when unknown
    pub param_names: Vec<String>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, id: Option<Id>, version: Version, authenticated: bool) -> Self {
        Self {
            method: method.into(),
            id,
            version,
            authenticated,
            param_names: Vec::new(),
        }
    }

    pub fn with_param_names(mut self, names: Vec<String>) -> Self {
        self.param_names = names;
        self
    }

    /// True when the caller expects no response body
    ///
    /// An absent id marks a notification in both versions; a `null` id only
    /// does in 1.0.
    pub fn is_notification(&self) -> bool {
        match &self.id {
            None => true,
            Some(id) => self.version == Version::V1 && id.is_null(),
        }
    }
}

/// Trait for method handlers
///
/// Implementations must be `Send + Sync`: the dispatcher is shared across
/// every task serving requests.
pub trait Handler: Send + Sync {
    /// Execute the method
    ///
    /// `Err` values that are protocol errors (`InvalidParams`,
    /// `Error::JsonRpc` with an application code, ...) reach the client
    /// unchanged; anything else is reported as an internal error.
    fn call(&self, ctx: RequestContext, params: Params) -> HandlerResult;
}

/// Adapter from an async closure to [`Handler`]
pub struct FnHandler<F> {
    func: F,
}

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, params: Params) -> HandlerResult {
        Box::pin((self.func)(ctx, params))
    }
}

/// Create a handler from an async closure over raw params
pub fn from_fn<F, Fut>(func: F) -> Arc<dyn Handler>
where
    F: Fn(RequestContext, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler { func })
}

/// Create a handler that deserializes params into `P` and serializes the
/// returned `R`
///
/// Positional params deserialize from an array (use a tuple for `P`), named
/// params from an object (use a struct). Named params that do not fit `P` as
/// an object are laid out in the method's declared argument order and tried
/// again as an array, with `null` for missing names, so a tuple handler can
/// serve keyword calls. A deserialization failure is an `InvalidParams`
/// error.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Arc<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(RequestContext, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |ctx, params: Params| {
        let func = Arc::clone(&func);
        async move {
            let params: P = bind_params(&ctx.param_names, params)?;
            let result = func(ctx, params).await?;
            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}

fn bind_params<P: serde::de::DeserializeOwned>(names: &[String], params: Params) -> Result<P> {
    let map = match params {
        Params::Named(map) if !names.is_empty() => map,
        other => return other.parse().map_err(|e| Error::InvalidParams(e.to_string())),
    };

    // a struct wants the object as sent
    if let Ok(params) = serde_json::from_value(Value::Object(map.clone())) {
        return Ok(params);
    }

    let ordered: Vec<Value> = names
        .iter()
        .map(|name| map.get(name).cloned().unwrap_or(Value::Null))
        .collect();
    Params::Positional(ordered)
        .parse()
        .map_err(|e| Error::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn ctx() -> RequestContext {
        RequestContext::new("test", Some(Id::from(1i64)), Version::V2, false)
    }

    #[derive(Deserialize)]
    struct EchoParams {
        string: String,
    }

    #[tokio::test]
    async fn test_raw_handler_reads_both_shapes() {
        let handler = from_fn(|_ctx, params| async move {
            Ok(params.get(0, "string").cloned().unwrap_or(Value::Null))
        });

        let positional = handler
            .call(ctx(), Params::from(vec![json!("Hello")]))
            .await
            .unwrap();
        assert_eq!(positional, json!("Hello"));

        let named: Params = serde_json::from_value(json!({"string": "Hello"})).unwrap();
        assert_eq!(handler.call(ctx(), named).await.unwrap(), json!("Hello"));
    }

    #[tokio::test]
    async fn test_typed_handler_tuple() {
        let handler = from_typed_fn(|_ctx, (a, b): (String, String)| async move { Ok(a + &b) });
        let result = handler
            .call(ctx(), Params::from(vec![json!("omg"), json!("wtf")]))
            .await
            .unwrap();
        assert_eq!(result, json!("omgwtf"));
    }

    #[tokio::test]
    async fn test_typed_handler_struct() {
        let handler = from_typed_fn(|_ctx, p: EchoParams| async move { Ok(p.string) });
        let named: Params = serde_json::from_value(json!({"string": "Hello"})).unwrap();
        assert_eq!(handler.call(ctx(), named).await.unwrap(), json!("Hello"));
    }

    #[tokio::test]
    async fn test_typed_handler_bad_params() {
        let handler = from_typed_fn(|_ctx, p: EchoParams| async move { Ok(p.string) });
        let err = handler
            .call(ctx(), Params::from(vec![json!(1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_typed_tuple_handler_bound_by_keyword() {
        let handler = from_typed_fn(|_ctx, (a, b): (String, String)| async move { Ok(a + &b) });
        let ctx = ctx().with_param_names(vec!["string".into(), "string2".into()]);

        // key order in the call does not matter, declared order does
        let named: Params = serde_json::from_value(json!({"string2": "wtf", "string": "omg"})).unwrap();
        assert_eq!(handler.call(ctx, named).await.unwrap(), json!("omgwtf"));
    }

    #[tokio::test]
    async fn test_typed_tuple_handler_missing_keyword_is_null() {
        let handler = from_typed_fn(|_ctx, (a, b): (String, Option<String>)| async move {
            Ok(format!("{}{}", a, b.unwrap_or_default()))
        });
        let ctx = ctx().with_param_names(vec!["string".into(), "string2".into()]);

        let named: Params = serde_json::from_value(json!({"string": "omg"})).unwrap();
        assert_eq!(handler.call(ctx, named).await.unwrap(), json!("omg"));
    }

    #[tokio::test]
    async fn test_typed_tuple_handler_without_names() {
        let handler = from_typed_fn(|_ctx, (a, b): (String, String)| async move { Ok(a + &b) });
        let named: Params = serde_json::from_value(json!({"string": "omg", "string2": "wtf"})).unwrap();
        let err = handler.call(ctx(), named).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[test]
    fn test_context_notification() {
        assert!(!ctx().is_notification());
        assert!(RequestContext::new("n", None, Version::V2, false).is_notification());
        assert!(RequestContext::new("n", None, Version::V1, false).is_notification());
        assert!(RequestContext::new("n", Some(Id::Null), Version::V1, false).is_notification());
        assert!(!RequestContext::new("n", Some(Id::Null), Version::V2, false).is_notification());
    }
}
