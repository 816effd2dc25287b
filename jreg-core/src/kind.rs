//! Abstract value types used in method signatures
//!
//! Every decoded JSON value falls into exactly one [`Kind`] other than
//! [`Kind::Any`]; `Any` is the wildcard that matches everything. Object and
//! Array are structural: a value is an Object if it is a JSON object, an
//! Array if it is a JSON array. Element types are never inspected.
//!
//! # Examples
//!
//! ```rust
//! use jreg_core::Kind;
//! use serde_json::json;
//!
//! assert_eq!(Kind::of(&json!("hello")), Kind::String);
//! assert_eq!(Kind::of(&json!({})), Kind::Object);
//! assert!(Kind::Any.matches(&json!(null)));
//! assert!(!Kind::Array.matches(&json!({})));
//!
//! assert_eq!("str".parse::<Kind>().unwrap(), Kind::String);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Abstract type tag of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Any,
    String,
    Number,
    Boolean,
    Object,
    Array,
    Nil,
}

impl Kind {
    /// Every tag, in declaration order
    pub const ALL: [Kind; 7] = [
        Kind::Any,
        Kind::String,
        Kind::Number,
        Kind::Boolean,
        Kind::Object,
        Kind::Array,
        Kind::Nil,
    ];

    /// Classify a value. Never returns [`Kind::Any`].
    pub fn of(value: &Value) -> Kind {
        match value {
            Value::Null => Kind::Nil,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Check a value against this declared type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Kind::Any => true,
            declared => *declared == Kind::of(value),
        }
    }

    /// Resolve a type token from a signature string
    ///
    /// Case-insensitive; accepts the canonical names plus common synonyms
    /// (`str`, `int`, `dict`, `list`, `none`, ...).
    pub fn decode(name: &str) -> Result<Kind> {
        let kind = match name.trim().to_ascii_lowercase().as_str() {
            "any" => Kind::Any,
            "string" | "str" | "unicode" => Kind::String,
            "number" | "num" | "int" | "integer" | "float" | "long" | "double" => Kind::Number,
            "boolean" | "bool" => Kind::Boolean,
            "object" | "obj" | "dict" | "map" => Kind::Object,
            "array" | "arr" | "list" | "tuple" | "set" => Kind::Array,
            "nil" | "null" | "none" => Kind::Nil,
            _ => {
                return Err(Error::invalid_signature(
                    name,
                    format!("unknown type `{}`", name.trim()),
                ))
            }
        };
        Ok(kind)
    }

    /// Canonical name, as rendered in signatures
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Any => "Any",
            Kind::String => "String",
            Kind::Number => "Number",
            Kind::Boolean => "Boolean",
            Kind::Object => "Object",
            Kind::Array => "Array",
            Kind::Nil => "Nil",
        }
    }
}

impl Default for Kind {
    fn default() -> Self {
        Kind::Any
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Kind::decode(s)
    }
}
