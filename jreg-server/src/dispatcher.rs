//! Request dispatcher
//!
//! The dispatcher turns a raw request body into a raw response body. It is
//! the only place where errors are converted to wire envelopes: every failure
//! along the way, a panicking handler included, ends up as a well-formed
//! response with exactly one of `result` and `error`.
//!
//! # Pipeline
//!
//! For each request envelope:
//!
//! 1. decode the body and check the envelope shape
//! 2. resolve the protocol version and the params shape it allows
//! 3. look up the method
//! 4. enforce authentication
//! 5. validate params
//! 6. invoke the handler
//! 7. validate the result and encode the response
//!
//! A JSON array body is a batch: each element runs through the pipeline in
//! order and the responses are returned as an array.
//!
//! # Examples
//!
//! ```rust
//! use jreg_server::{from_fn, Dispatcher, DispatcherConfig, MethodOptions, Registry};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         "jsonrpc.test(String) -> String",
//!         from_fn(|_ctx, params| async move { Ok(params.get(0, "a").cloned().unwrap_or_default()) }),
//!         MethodOptions::new(),
//!     )
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(registry, DispatcherConfig::default());
//! let body = dispatcher
//!     .dispatch(br#"{"method":"jsonrpc.test","params":["Hello"],"id":1}"#, false)
//!     .await;
//! let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
//! assert_eq!(response, json!({"result": "Hello", "id": 1}));
//! # }
//! ```

use crate::handler::RequestContext;
use crate::metrics::ServerMetrics;
use crate::registry::Registry;
use crate::validate::{validate_params, validate_return};
use futures::FutureExt;
use jreg_core::codec::{self, DecodedRequest, Incoming};
use jreg_core::{Error, Id, JsonRpcResponse, Result, Version};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Name of the built-in method listing, served when introspection is on
pub const DESCRIBE_METHOD: &str = "system.describe";

/// Returned if a response cannot be serialized at all
const FALLBACK_BODY: &[u8] = br#"{"error":{"code":-32603,"message":"Internal error"},"id":null}"#;

/// Dispatcher-wide policy
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Every method that is not `safe` needs an authenticated caller
    pub require_authentication: bool,
    /// Drop `data.detail` from internal errors
    pub redact_internal_errors: bool,
    /// Serve `system.describe` with the registry listing
    pub introspection: bool,
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_authentication_required(mut self, required: bool) -> Self {
        self.require_authentication = required;
        self
    }

    pub fn with_redacted_internal_errors(mut self, redact: bool) -> Self {
        self.redact_internal_errors = redact;
        self
    }

    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }
}

/// A response envelope and whether its request was a notification
#[derive(Debug, Clone)]
pub struct Reply {
    pub response: JsonRpcResponse,
    pub notification: bool,
}

/// Everything a transport needs to answer one body
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    replies: Vec<Reply>,
    batch: bool,
}

impl DispatchOutcome {
    fn single(reply: Reply) -> Self {
        Self {
            replies: vec![reply],
            batch: false,
        }
    }

    pub fn is_batch(&self) -> bool {
        self.batch
    }

    /// True when no reply was asked for: every request was a notification
    pub fn is_notification(&self) -> bool {
        self.replies.iter().all(|r| r.notification)
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    /// Encode every envelope, notifications included
    pub fn to_body(&self) -> Vec<u8> {
        let responses: Vec<&JsonRpcResponse> = self.replies.iter().map(|r| &r.response).collect();
        self.encode(&responses)
    }

    /// Encode only the envelopes a caller is waiting for
    ///
    /// `None` when every request was a notification.
    pub fn to_reply_body(&self) -> Option<Vec<u8>> {
        let responses: Vec<&JsonRpcResponse> = self
            .replies
            .iter()
            .filter(|r| !r.notification)
            .map(|r| &r.response)
            .collect();
        if responses.is_empty() {
            None
        } else {
            Some(self.encode(&responses))
        }
    }

    fn encode(&self, responses: &[&JsonRpcResponse]) -> Vec<u8> {
        match (self.batch, responses) {
            (false, [response]) => encode_body(response),
            _ => encode_body(&responses),
        }
    }
}

fn encode_body<T: Serialize>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response");
            FALLBACK_BODY.to_vec()
        }
    }
}

/// Routes request bodies to registered methods
///
/// Cheap to clone; the registry is shared and never mutated.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatcherConfig,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Dispatcher {
    pub fn new(registry: Registry, config: DispatcherConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            metrics: None,
        }
    }

    /// Record request metrics on `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        metrics.record_registry_size(self.registry.len() as u64);
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Answer a raw body with a raw body
    ///
    /// `authenticated` is the transport's verdict on the caller. Notifications
    /// still receive an envelope here; use [`Dispatcher::dispatch_outcome`]
    /// to suppress them.
    pub async fn dispatch(&self, body: &[u8], authenticated: bool) -> Vec<u8> {
        self.dispatch_outcome(body, authenticated).await.to_body()
    }

    /// Answer a raw body, keeping track of which requests were notifications
    #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn dispatch_outcome(&self, body: &[u8], authenticated: bool) -> DispatchOutcome {
        let incoming = match codec::decode(body) {
            Ok(incoming) => incoming,
            Err(e) => {
                // an empty batch is still a batch, answered in 2.0 form
                let version = match e {
                    Error::InvalidRequest(_) => Version::V2,
                    _ => Version::V1,
                };
                tracing::debug!(error = %e, "Rejected undecodable body");
                return DispatchOutcome::single(Reply {
                    response: self.error_response(version, &e, Id::Null),
                    notification: false,
                });
            }
        };

        match incoming {
            Incoming::Single(value) => DispatchOutcome::single(self.handle_value(value, authenticated).await),
            Incoming::Batch(values) => {
                tracing::debug!(batch_size = values.len(), "Processing batch");
                if let Some(ref m) = self.metrics {
                    m.record_batch(values.len() as u64);
                }

                let mut replies = Vec::with_capacity(values.len());
                for value in values {
                    replies.push(self.handle_value(value, authenticated).await);
                }
                DispatchOutcome {
                    replies,
                    batch: true,
                }
            }
        }
    }

    /// Run one envelope value through the pipeline
    pub async fn handle_value(&self, value: Value, authenticated: bool) -> Reply {
        match codec::decode_request(value) {
            Ok(request) => {
                let notification = request.is_notification();
                Reply {
                    response: self.handle_request(request, authenticated).await,
                    notification,
                }
            }
            Err(rejected) => {
                tracing::debug!(error = %rejected.error, id = %rejected.id, "Rejected request envelope");
                Reply {
                    response: self.error_response(rejected.version, &rejected.error, rejected.id),
                    notification: false,
                }
            }
        }
    }

    /// Resolve, authorize, validate and invoke a decoded request
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, id = %request.response_id(), version = %request.version)
    )]
    pub async fn handle_request(&self, request: DecodedRequest, authenticated: bool) -> JsonRpcResponse {
        let start = Instant::now();
        let version = request.version;
        let id = request.response_id();
        let method = request.method.clone();

        let outcome = self.execute(request, authenticated).await;

        if let Some(ref m) = self.metrics {
            let status = if outcome.is_ok() { "success" } else { "error" };
            m.record_request(&method, status, start.elapsed().as_secs_f64());
        }

        match outcome {
            Ok(result) => JsonRpcResponse::success(version, result, id),
            Err(e) => self.error_response(version, &e, id),
        }
    }

    async fn execute(&self, request: DecodedRequest, authenticated: bool) -> Result<Value> {
        let DecodedRequest {
            version,
            method: name,
            params,
            id,
        } = request;

        let method = match self.registry.lookup(&name) {
            Some(method) => method,
            None if self.config.introspection && name == DESCRIBE_METHOD => {
                return Ok(self.registry.describe());
            }
            None => return Err(Error::MethodNotFound(name)),
        };

        if method.requires_authentication(self.config.require_authentication) && !authenticated {
            return Err(Error::Unauthenticated(name));
        }

        validate_params(&method, &params)?;

        let ctx = RequestContext::new(name, id, version, authenticated)
            .with_param_names(method.param_names.clone());
        let handler = Arc::clone(&method.handler);
        // call() runs inside the future so a panic while building it is caught too
        let invocation = async move { handler.call(ctx, params).await };
        let result = match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.is_protocol_error() => return Err(e),
            Ok(Err(e)) => return Err(Error::Internal(e.to_string())),
            Err(panic) => return Err(Error::Internal(panic_message(panic))),
        };

        validate_return(&method, &result)?;
        Ok(result)
    }

    fn error_response(&self, version: Version, error: &Error, id: Id) -> JsonRpcResponse {
        let mut data = error.to_error_data();

        // a malformed body is the caller's fault, not ours
        if error.is_protocol_error() || matches!(error, Error::Parse(_)) {
            tracing::debug!(code = data.code, error = %error, "Request failed");
        } else {
            tracing::error!(code = data.code, error = %error, "Request failed with internal error");
            if self.config.redact_internal_errors {
                data = data.without_data();
            }
        }

        if let Some(ref m) = self.metrics {
            m.record_error(data.code);
        }

        JsonRpcResponse::error(version, data, id)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}
