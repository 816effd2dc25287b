//! Encoding and decoding of JSON-RPC envelopes
//!
//! Incoming bodies are decoded in two steps. [`decode`] turns raw bytes into
//! either a single envelope value or a batch, failing with a parse error when
//! the bytes are not JSON. [`decode_request`] then checks that a single value
//! is a well-formed request envelope for its protocol version.
//!
//! Both steps keep as much of the request as they can: once the envelope is
//! known to be an object its id is recoverable, so later failures can echo it.
//!
//! # Examples
//!
//! ```rust
//! use jreg_core::codec::{self, Incoming};
//! use jreg_core::Version;
//!
//! let incoming = codec::decode(br#"{"jsonrpc":"2.0","method":"m","params":{"a":1},"id":1}"#).unwrap();
//! let Incoming::Single(value) = incoming else { panic!("not a batch") };
//! let request = codec::decode_request(value).unwrap();
//! assert_eq!(request.version, Version::V2);
//! assert_eq!(request.method, "m");
//! ```

use crate::error::{Error, Result};
use crate::types::{Id, JsonRpcRequest, JsonRpcResponse, Params, Version};
use serde::Serialize;
use serde_json::Value;

/// A decoded body: one envelope or a batch of them
#[derive(Debug, Clone)]
pub enum Incoming {
    Single(Value),
    Batch(Vec<Value>),
}

/// A request envelope that passed structural checks
#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub version: Version,
    pub method: String,
    pub params: Params,
    /// `None` when the request carried no `id` member
    pub id: Option<Id>,
}

impl DecodedRequest {
    /// Id to echo in the response (`null` when absent)
    pub fn response_id(&self) -> Id {
        self.id.clone().unwrap_or_default()
    }

    /// A request without a meaningful id expects no response body
    ///
    /// 1.0 marks notifications with a `null` id, 2.0 by leaving the id out.
    pub fn is_notification(&self) -> bool {
        match &self.id {
            None => true,
            Some(id) => self.version == Version::V1 && id.is_null(),
        }
    }
}

/// A request rejected by [`decode_request`], with whatever context survived
#[derive(Debug, Clone)]
pub struct RejectedRequest {
    pub error: Error,
    pub version: Version,
    pub id: Id,
}

/// Decode raw bytes into a single envelope or a batch
///
/// # Errors
///
/// - `Error::Parse` if the bytes are not JSON
/// - `Error::InvalidRequest` for an empty batch
pub fn decode(data: &[u8]) -> Result<Incoming> {
    let value: Value = serde_json::from_slice(data).map_err(|e| Error::Parse(e.to_string()))?;

    match value {
        Value::Array(items) if items.is_empty() => {
            Err(Error::InvalidRequest("Batch cannot be empty".to_string()))
        }
        Value::Array(items) => Ok(Incoming::Batch(items)),
        other => Ok(Incoming::Single(other)),
    }
}

/// Check a single envelope value and split it into its parts
///
/// Envelope-level failures (not an object, missing or non-string `method`)
/// report `id = null` as the id cannot be trusted. A params shape that the
/// resolved version does not allow is reported with the request's own id.
pub fn decode_request(value: Value) -> std::result::Result<DecodedRequest, RejectedRequest> {
    let mut envelope = match value {
        Value::Object(map) => map,
        other => {
            return Err(RejectedRequest {
                error: Error::InvalidRequest(format!(
                    "Request must be an object, got {}",
                    crate::Kind::of(&other)
                )),
                version: Version::V1,
                id: Id::Null,
            })
        }
    };

    let version = Version::from_member(envelope.get("jsonrpc"));

    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => {
            return Err(RejectedRequest {
                error: Error::InvalidRequest("`method` must be a string".to_string()),
                version,
                id: Id::Null,
            })
        }
        None => {
            return Err(RejectedRequest {
                error: Error::InvalidRequest("Request requires a `method` member".to_string()),
                version,
                id: Id::Null,
            })
        }
    };

    let id = envelope.remove("id").map(Id::from_value);
    let reject = |message: String| RejectedRequest {
        error: Error::InvalidRequest(message),
        version,
        id: id.clone().unwrap_or_default(),
    };

    let params = Params::from_member(envelope.remove("params"))
        .ok_or_else(|| reject("`params` must be an array or an object".to_string()))?;

    if params.is_named() && !version.allows_named_params() {
        return Err(reject(
            "JSON-RPC 1.0 requires positional parameters".to_string(),
        ));
    }

    Ok(DecodedRequest {
        version,
        method,
        params,
        id,
    })
}

/// Encode any serializable envelope to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request
pub fn encode_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Encode a response
pub fn encode_response(resp: &JsonRpcResponse) -> Result<String> {
    encode(resp)
}

/// Decode a response body
///
/// # Errors
///
/// `Error::Parse` when the body is not JSON, `Error::InvalidRequest` when it
/// is JSON but carries neither `result` nor `error`.
///
/// Some 1.0 servers send both members, with a `null` for the unused one. A
/// non-null `error` wins and the `result` is dropped.
pub fn decode_response(data: &[u8]) -> Result<JsonRpcResponse> {
    let value: Value = serde_json::from_slice(data).map_err(|e| Error::Parse(e.to_string()))?;
    let mut response: JsonRpcResponse =
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))?;

    if response.is_error() {
        response.result = None;
    } else if !response.is_success() {
        return Err(Error::InvalidRequest(
            "Response must contain `result` or `error`".to_string(),
        ));
    }
    Ok(response)
}
