//! Service proxy: the calling side of a jreg service
//!
//! A [`ServiceProxy`] speaks one protocol version. It builds request
//! envelopes with fresh ids, pushes them through its [`Transport`] and turns
//! response envelopes back into `Result`s: a server `error` member becomes
//! `Error::JsonRpc` carrying the same code, message and data.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jreg_client::{ServiceProxy, WsTransport};
//! use jreg_core::{Params, Version};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> jreg_core::Result<()> {
//! let transport = Arc::new(WsTransport::connect("ws://127.0.0.1:8080").await?);
//! let proxy = ServiceProxy::new(transport, Version::V2);
//!
//! let greeting: String = proxy.call_as("jsonrpc.test", vec![json!("Hello")]).await?;
//! let named: serde_json::Map<_, _> = [("string".to_string(), json!("Hello"))].into_iter().collect();
//! let same = proxy.call("jsonrpc.test", Params::Named(named)).await?;
//! # Ok(())
//! # }
//! ```

use crate::transport::Transport;
use jreg_core::{codec, Error, Id, JsonRpcRequest, Params, Result, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const NAMED_PARAMS_ON_V1: &str = "Unsupported arg type for JSON-RPC 1.0 \
     (the default version for this client, pass version=\"2.0\" to use keyword arguments)";

/// Client-side stand-in for a remote service
pub struct ServiceProxy {
    transport: Arc<dyn Transport>,
    version: Version,
    next_id: AtomicU64,
}

impl ServiceProxy {
    pub fn new(transport: Arc<dyn Transport>, version: Version) -> Self {
        Self {
            transport,
            version,
            next_id: AtomicU64::new(1),
        }
    }

    /// A 1.0 proxy, the default dialect
    pub fn v1(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, Version::V1)
    }

    pub fn v2(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, Version::V2)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Call `method` and return its result
    ///
    /// # Errors
    ///
    /// - `Error::Usage` for named params on a 1.0 proxy; nothing is sent
    /// - `Error::JsonRpc` when the server answers with an error
    /// - `Error::Transport` / `Error::Parse` when no valid reply comes back
    #[tracing::instrument(skip(self, params), fields(method = %method, version = %self.version))]
    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        let params = params.into();
        self.check_params(&params)?;

        let id = Id::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = JsonRpcRequest::new(self.version, method, params, id.clone());
        let body = codec::encode_request(&request)?.into_bytes();

        let reply = self.transport.send(body).await?;
        let response = codec::decode_response(&reply)?;

        if response.id != id {
            tracing::warn!(expected = %id, got = %response.id, "Response id mismatch");
        }

        if let Some(error) = response.error {
            tracing::debug!(code = error.code, message = %error.message, "Call failed");
            return Err(Error::JsonRpc(error));
        }

        // decode_response guarantees a result when there is no error
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Call `method` and deserialize its result into `R`
    pub async fn call_as<R: DeserializeOwned>(&self, method: &str, params: impl Into<Params>) -> Result<R> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Send a notification: no id, no result
    #[tracing::instrument(skip(self, params), fields(method = %method, version = %self.version))]
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        let params = params.into();
        self.check_params(&params)?;

        // 1.0 marks notifications with an explicit null id; 2.0 omits it
        let request = JsonRpcRequest::new(self.version, method, params, Id::Null);
        let mut value = serde_json::to_value(&request)?;
        if self.version == Version::V2 {
            if let Value::Object(ref mut map) = value {
                map.remove("id");
            }
        }
        let body = codec::encode(&value)?.into_bytes();

        self.transport.send_notification(body).await
    }

    fn check_params(&self, params: &Params) -> Result<()> {
        if params.is_named() && !self.version.allows_named_params() {
            return Err(Error::Usage(NAMED_PARAMS_ON_V1.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("version", &self.version)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
