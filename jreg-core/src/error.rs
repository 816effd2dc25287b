//! Error types for jreg
//!
//! Two error types live here:
//!
//! - **Error**: the closed set of failures the registry, dispatcher and proxy
//!   can produce (uses thiserror)
//! - **JsonRpcErrorData**: the `error` member of a JSON-RPC response
//!
//! # Error Codes
//!
//! The reserved JSON-RPC codes are preserved exactly:
//! - `-32700`: Parse error (body is not JSON)
//! - `-32600`: Invalid request (not a valid envelope)
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! Authentication failures use `401`, outside the reserved range, so clients
//! can tell "log in and try again" apart from "fix your call".
//!
//! # Examples
//!
//! ```rust
//! use jreg_core::{Error, JsonRpcErrorData};
//!
//! let error = Error::MethodNotFound("unknownMethod".into());
//! let data = error.to_error_data();
//! assert_eq!(data.code, -32601);
//! assert_eq!(data.code, JsonRpcErrorData::method_not_found("unknownMethod").code);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved and application error codes used on the wire
pub mod code {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const AUTHENTICATION_REQUIRED: i32 = 401;
}

/// Result type for jreg operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for jreg operations
///
/// Every variant has a fixed mapping to a wire error, see
/// [`Error::to_error_data`]. Handlers return these from their futures; the
/// dispatcher decides which ones are protocol errors that reach the client
/// as-is and which ones are collapsed into an internal error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An error that is already in wire format, either received from a
    /// remote peer or raised by a handler with an application-specific code
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// The request body is not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// The body is JSON but not a valid request envelope
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No method with this name is registered
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Arity or type mismatch against the method signature
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The method requires an authenticated caller
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    /// Unexpected failure while executing a method, or a result that does
    /// not match the declared return type
    #[error("Internal error: {0}")]
    Internal(String),

    /// A method signature string could not be parsed
    #[error("Invalid signature `{signature}`: {reason}")]
    InvalidSignature {
        /// The signature text as given to the parser
        signature: String,
        /// What was wrong with it
        reason: String,
    },

    /// Converting between Rust values and JSON failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The transport carrying encoded envelopes failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The caller used the client API in a way the protocol version forbids
    #[error("{0}")]
    Usage(String),
}

impl Error {
    /// Build an [`Error::InvalidSignature`]
    pub fn invalid_signature(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSignature {
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is one of the JSON-RPC protocol errors that a
    /// handler may raise and have delivered to the client unchanged
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Error::JsonRpc(_)
                | Error::InvalidRequest(_)
                | Error::MethodNotFound(_)
                | Error::InvalidParams(_)
                | Error::Unauthenticated(_)
        )
    }

    /// Convert into the `error` member of a response
    ///
    /// Protocol errors keep their own message. Everything else is reported as
    /// an internal error whose message is the generic "Internal error" and
    /// whose `data.detail` carries the underlying text.
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        match self {
            Error::JsonRpc(data) => data.clone(),
            Error::Parse(_) => JsonRpcErrorData::parse_error(),
            Error::InvalidRequest(msg) => JsonRpcErrorData::invalid_request(msg.clone()),
            Error::MethodNotFound(method) => JsonRpcErrorData::method_not_found(method.clone()),
            Error::InvalidParams(msg) => JsonRpcErrorData::invalid_params(msg.clone()),
            Error::Unauthenticated(method) => JsonRpcErrorData::authentication_required(method.clone()),
            Error::Internal(detail) => JsonRpcErrorData::internal_error(detail.clone()),
            other => JsonRpcErrorData::internal_error(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// The `error` member of a JSON-RPC response
///
/// Must contain `code` and `message`, may contain `data`.
///
/// # Examples
///
/// ```rust
/// use jreg_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let error = JsonRpcErrorData::method_not_found("calculate");
/// assert_eq!(error.code, -32601);
///
/// let custom = JsonRpcErrorData::with_data(
///     1001,
///     "Insufficient funds",
///     json!({"balance": 50, "required": 100})
/// );
/// assert_eq!(custom.data.unwrap()["balance"], 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i32,

    /// Short human-readable description
    pub message: String,

    /// Optional structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error with code, message and structured data
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(code::PARSE_ERROR, "Parse error")
    }

    /// Invalid request (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(code::INVALID_REQUEST, msg)
    }

    /// Method not found (-32601)
    ///
    /// ```rust
    /// use jreg_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(
            code::METHOD_NOT_FOUND,
            format!("Method not found: {}", method.into()),
        )
    }

    /// Invalid params (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(code::INVALID_PARAMS, msg)
    }

    /// Internal error (-32603)
    ///
    /// The message is always the generic "Internal error"; `detail` goes into
    /// `data` so that the primary message never discloses handler internals.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::with_data(
            code::INTERNAL_ERROR,
            "Internal error",
            serde_json::json!({ "detail": detail.into() }),
        )
    }

    /// Authentication required (401)
    pub fn authentication_required(method: impl Into<String>) -> Self {
        Self::with_data(
            code::AUTHENTICATION_REQUIRED,
            "Authentication required",
            serde_json::json!({ "method": method.into() }),
        )
    }

    /// Drop the `data` member
    pub fn without_data(mut self) -> Self {
        self.data = None;
        self
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_reserved_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error(), -32700),
            (JsonRpcErrorData::invalid_request("test"), -32600),
            (JsonRpcErrorData::method_not_found("test"), -32601),
            (JsonRpcErrorData::invalid_params("test"), -32602),
            (JsonRpcErrorData::internal_error("test"), -32603),
        ];

        for (error, expected_code) in errors {
            assert_eq!(error.code, expected_code);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn test_authentication_code_outside_reserved_range() {
        let error = JsonRpcErrorData::authentication_required("jsonrpc.testAuth");
        assert_eq!(error.code, 401);
        assert!(!(-32768..=-32000).contains(&error.code));
        assert_eq!(error.data.unwrap()["method"], "jsonrpc.testAuth");
    }

    #[test]
    fn test_internal_error_keeps_detail_out_of_message() {
        let error = JsonRpcErrorData::internal_error("index out of range");
        assert_eq!(error.message, "Internal error");
        assert_eq!(error.data, Some(json!({"detail": "index out of range"})));
        assert!(error.without_data().data.is_none());
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(Error::Parse("eof".into()).to_error_data().code, -32700);
        assert_eq!(Error::InvalidRequest("x".into()).to_error_data().code, -32600);
        assert_eq!(Error::InvalidParams("x".into()).to_error_data().code, -32602);
        assert_eq!(Error::Unauthenticated("m".into()).to_error_data().code, 401);

        let custom = JsonRpcErrorData::new(1001, "Insufficient funds");
        assert_eq!(Error::JsonRpc(custom.clone()).to_error_data(), custom);

        let data = Error::Serialization("bad utf-8".into()).to_error_data();
        assert_eq!(data.code, -32603);
        assert_eq!(data.message, "Internal error");
        assert!(data.data.unwrap()["detail"]
            .as_str()
            .unwrap()
            .contains("bad utf-8"));
    }

    #[test]
    fn test_protocol_error_classification() {
        assert!(Error::InvalidParams("x".into()).is_protocol_error());
        assert!(Error::JsonRpc(JsonRpcErrorData::new(7, "custom")).is_protocol_error());
        assert!(!Error::Internal("x".into()).is_protocol_error());
        assert!(!Error::Parse("x".into()).is_protocol_error());
        assert!(!Error::Serialization("x".into()).is_protocol_error());
        assert!(!Error::invalid_signature("m(", "unclosed").is_protocol_error());
    }

    #[test]
    fn test_invalid_signature_display() {
        let error = Error::invalid_signature("jsonrpc(nowai)", "unknown parameter type `nowai`");
        let display = error.to_string();
        assert!(display.contains("jsonrpc(nowai)"));
        assert!(display.contains("nowai"));
    }

    #[test]
    fn test_error_data_deserialization() {
        let json = r#"{"code":-32601,"message":"Method not found"}"#;
        let error: JsonRpcErrorData = serde_json::from_str(json).unwrap();
        assert_eq!(error.code, -32601);
        assert!(error.data.is_none());

        let serialized = serde_json::to_string(&error).unwrap();
        assert!(!serialized.contains("data"));
    }

    #[test]
    fn test_error_data_display() {
        let display = JsonRpcErrorData::method_not_found("unknownMethod").to_string();
        assert_eq!(display, "[-32601] Method not found: unknownMethod");
    }
}
