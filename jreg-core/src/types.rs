//! JSON-RPC 1.0 and 2.0 envelopes
//!
//! The two dialects share one set of types:
//!
//! - a request carries `jsonrpc: "2.0"` only in 2.0; its absence means 1.0
//! - 1.0 params are always positional, 2.0 params may be named
//! - a response echoes `jsonrpc` only for 2.0 and holds exactly one of
//!   `result` and `error`
//!
//! # Request IDs
//!
//! The id is echoed back verbatim, so [`Id`] keeps any JSON value a client
//! may send. A missing id is treated like `null`.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Protocol dialect of a request or response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// JSON-RPC 1.0: positional params, no `jsonrpc` member
    #[default]
    V1,
    /// JSON-RPC 2.0: positional or named params, `"jsonrpc": "2.0"`
    V2,
}

impl Version {
    /// Resolve the dialect from a request's `jsonrpc` member
    ///
    /// Only `"2.0"` selects 2.0; anything else, including absence, is 1.0.
    pub fn from_member(member: Option<&Value>) -> Self {
        match member {
            Some(Value::String(s)) if s == "2.0" => Version::V2,
            Some(Value::Number(n)) if n.as_f64() == Some(2.0) => Version::V2,
            _ => Version::V1,
        }
    }

    /// Value of the `jsonrpc` member to put on the wire, if any
    pub fn member(&self) -> Option<String> {
        match self {
            Version::V1 => None,
            Version::V2 => Some("2.0".to_string()),
        }
    }

    pub fn allows_named_params(&self) -> bool {
        matches!(self, Version::V2)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => f.write_str("1.0"),
            Version::V2 => f.write_str("2.0"),
        }
    }
}

/// Request identifier, echoed back verbatim
///
/// ```rust
/// use jreg_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Id {
    /// Null or absent identifier
    #[default]
    Null,
    String(String),
    Number(serde_json::Number),
    /// Anything else a client chose to send (arrays, objects, booleans)
    Other(Value),
}

impl Id {
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }

    /// Build an id from whatever value the request carried
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Id::Null,
            Value::String(s) => Id::String(s),
            Value::Number(n) => Id::Number(n),
            other => Id::Other(other),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => write!(f, "null"),
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n.into())
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n.into())
    }
}

/// Call arguments, bound either by position or by name
///
/// ```rust
/// use jreg_core::Params;
/// use serde_json::json;
///
/// let positional = Params::from(vec![json!("omg"), json!("wtf")]);
/// assert_eq!(positional.get(1, "string2"), Some(&json!("wtf")));
///
/// let named: Params = serde_json::from_value(json!({"string2": "wtf"})).unwrap();
/// assert_eq!(named.get(1, "string2"), Some(&json!("wtf")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl Params {
    /// Convert the `params` member of a request
    ///
    /// Missing params become an empty positional list. Returns `None` for
    /// scalars, which are never valid params.
    pub fn from_member(member: Option<Value>) -> Option<Self> {
        match member {
            None | Some(Value::Null) => Some(Params::Positional(Vec::new())),
            Some(Value::Array(items)) => Some(Params::Positional(items)),
            Some(Value::Object(map)) => Some(Params::Named(map)),
            Some(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Params::Named(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Positional(items) => items.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch an argument: by `position` for positional calls, by `name` for
    /// named ones
    pub fn get(&self, position: usize, name: &str) -> Option<&Value> {
        match self {
            Params::Positional(items) => items.get(position),
            Params::Named(map) => map.get(name),
        }
    }

    /// Deserialize into a typed argument struct or tuple
    ///
    /// Positional params deserialize from a JSON array (tuples, `Vec`s,
    /// tuple structs), named ones from an object (structs, maps).
    pub fn parse<T: serde::de::DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.into_value())
    }

    pub fn into_value(self) -> Value {
        match self {
            Params::Positional(items) => Value::Array(items),
            Params::Named(map) => Value::Object(map),
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// Request envelope
///
/// ```rust
/// use jreg_core::{JsonRpcRequest, Params, Version, Id};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new(Version::V1, "jsonrpc.test", Params::from(vec![json!("Hello")]), Id::from(1i64));
/// let text = serde_json::to_string(&req).unwrap();
/// assert!(!text.contains("jsonrpc\":"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// `"2.0"` for 2.0 requests, absent for 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub id: Id,
}

impl JsonRpcRequest {
    pub fn new(version: Version, method: impl Into<String>, params: Params, id: Id) -> Self {
        Self {
            jsonrpc: version.member(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn version(&self) -> Version {
        let member = self.jsonrpc.clone().map(Value::String);
        Version::from_member(member.as_ref())
    }
}

/// Response envelope
///
/// Exactly one of `result` and `error` is set; the constructors enforce it.
///
/// ```rust
/// use jreg_core::{JsonRpcResponse, JsonRpcErrorData, Id, Version};
/// use serde_json::json;
///
/// let ok = JsonRpcResponse::success(Version::V2, json!("omgwtf"), Id::from(1i64));
/// assert!(ok.is_success());
///
/// let err = JsonRpcResponse::error(Version::V1, JsonRpcErrorData::method_not_found("nope"), Id::Null);
/// assert!(err.is_error());
/// assert!(err.jsonrpc.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Present on success; a present `null` is a valid result
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    #[serde(default)]
    pub id: Id,
}

impl JsonRpcResponse {
    pub fn success(version: Version, result: Value, id: Id) -> Self {
        Self {
            jsonrpc: version.member(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(version: Version, error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: version.member(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Keep `"result": null` as `Some(Value::Null)` instead of `None`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
