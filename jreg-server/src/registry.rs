//! Method registry
//!
//! The registry maps method names to [`RegisteredMethod`]s: a parsed
//! signature, the handler, and the flags that govern authentication and
//! validation.
//!
//! # Lifecycle
//!
//! Methods are registered during startup. Once the registry is handed to a
//! [`Dispatcher`](crate::Dispatcher) it sits behind an `Arc` and is never
//! mutated again, so concurrent lookups need no locking.
//!
//! Registering a name twice replaces the first entry: the last registration
//! wins.
//!
//! # Examples
//!
//! ```rust
//! use jreg_server::{from_fn, MethodOptions, Registry};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         "jsonrpc.checkedEcho(string=str, string2=str) -> str",
//!         from_fn(|_ctx, params| async move {
//!             let a = params.get(0, "string").and_then(|v| v.as_str()).unwrap_or_default();
//!             let b = params.get(1, "string2").and_then(|v| v.as_str()).unwrap_or_default();
//!             Ok(serde_json::json!(format!("{}{}", a, b)))
//!         }),
//!         MethodOptions::new().safe().validate(),
//!     )
//!     .unwrap();
//!
//! assert!(registry.contains("jsonrpc.checkedEcho"));
//! ```

use crate::handler::Handler;
use jreg_core::{parse_signature, MethodSignature, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Flags and hints supplied at registration
#[derive(Debug, Clone, Default)]
pub struct MethodOptions {
    /// Require an authenticated caller
    pub authenticated: bool,
    /// Callable without authentication even when required
    pub safe: bool,
    /// Check params and result against the signature
    pub validate: bool,
    /// The handler's own parameter names, used to name positional types
    pub param_names: Vec<String>,
}

impl MethodOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn safe(mut self) -> Self {
        self.safe = true;
        self
    }

    pub fn validate(mut self) -> Self {
        self.validate = true;
        self
    }

    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.param_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A signature bound to its handler
pub struct RegisteredMethod {
    pub signature: MethodSignature,
    pub handler: Arc<dyn Handler>,
    pub authenticated: bool,
    pub safe: bool,
    pub validate: bool,
    /// Declared argument order, used to bind named params to positional
    /// handlers. Taken from the signature, or from the registration hint
    /// for a bare name.
    pub param_names: Vec<String>,
}

impl RegisteredMethod {
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// Whether this method needs an authenticated caller, given the
    /// dispatcher-wide policy
    pub fn requires_authentication(&self, require_globally: bool) -> bool {
        !self.safe && (self.authenticated || require_globally)
    }

    /// JSON description for method browsers
    pub fn describe(&self) -> Value {
        // null marks a wildcard, distinct from an empty list
        let params = if self.signature.is_wildcard() {
            Value::Null
        } else {
            json!(self.signature.params())
        };
        json!({
            "name": self.signature.name(),
            "signature": self.signature.to_string(),
            "params": params,
            "returns": self.signature.returns(),
            "authenticated": self.authenticated,
            "safe": self.safe,
            "validate": self.validate,
        })
    }
}

impl std::fmt::Debug for RegisteredMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredMethod")
            .field("signature", &self.signature.to_string())
            .field("authenticated", &self.authenticated)
            .field("safe", &self.safe)
            .field("validate", &self.validate)
            .finish()
    }
}

/// Name → method map
#[derive(Clone, Default)]
pub struct Registry {
    methods: HashMap<String, Arc<RegisteredMethod>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `signature` and register `handler` under the parsed name
    ///
    /// Positional types in the signature are named after
    /// `options.param_names`. An existing method with the same name is
    /// replaced.
    ///
    /// # Errors
    ///
    /// `Error::InvalidSignature` when the signature does not parse.
    pub fn register(
        &mut self,
        signature: &str,
        handler: Arc<dyn Handler>,
        options: MethodOptions,
    ) -> Result<()> {
        let signature = parse_signature(signature, &options.param_names)?;
        let name = signature.name().to_string();
        let param_names = if signature.is_wildcard() {
            options.param_names
        } else {
            signature.param_names().into_iter().map(String::from).collect()
        };

        let method = RegisteredMethod {
            signature,
            handler,
            authenticated: options.authenticated,
            safe: options.safe,
            validate: options.validate,
            param_names,
        };

        tracing::debug!(method = %name, signature = %method.signature, "Registering method");
        if self.methods.insert(name.clone(), Arc::new(method)).is_some() {
            tracing::debug!(method = %name, "Replaced previously registered method");
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<RegisteredMethod>> {
        self.methods.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// All methods, sorted by name
    pub fn methods(&self) -> Vec<Arc<RegisteredMethod>> {
        let mut methods: Vec<_> = self.methods.values().cloned().collect();
        methods.sort_by(|a, b| a.name().cmp(b.name()));
        methods
    }

    /// JSON descriptions of all methods, sorted by name
    pub fn describe(&self) -> Value {
        Value::Array(self.methods().iter().map(|m| m.describe()).collect())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("methods", &self.methods().iter().map(|m| m.name().to_string()).collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent construction of a [`Registry`]
///
/// Signature errors are collected and reported by [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    registry: Registry,
    error: Option<jreg_core::Error>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, signature: &str, handler: Arc<dyn Handler>, options: MethodOptions) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register(signature, handler, options) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Build the registry, or return the first signature error
    pub fn build(self) -> Result<Registry> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.registry),
        }
    }
}
