//! Method signature parsing
//!
//! A signature is a compact textual declaration registered alongside a
//! handler:
//!
//! ```text
//! NAME [ "(" PARAMLIST? ")" ] [ "->" RETURNTYPE ]
//! ```
//!
//! - `NAME` is a dotted identifier (`[A-Za-z0-9._-]+`)
//! - `PARAMLIST` is a comma separated list of bare type tokens (positional)
//!   or `name=Type` pairs (named). Once a named item appears, every later
//!   item must be named too.
//! - `RETURNTYPE` is a single type token. Without it the return type is `Any`.
//!
//! Positional items take their names from the caller-supplied hint (the
//! handler's own parameter names) and fall back to `a`, `b`, `c`, ...
//!
//! A signature without a parameter list accepts any params unchecked; `()`
//! declares a method that takes none.
//!
//! # Examples
//!
//! ```rust
//! use jreg_core::{parse_signature, Kind};
//!
//! let sig = parse_signature("m(str, b=str) -> dict", &[] as &[&str]).unwrap();
//! assert_eq!(sig.name(), "m");
//! assert_eq!(sig.param_names(), vec!["a", "b"]);
//! assert_eq!(sig.returns(), Kind::Object);
//!
//! let wildcard = parse_signature("jsonrpc.methodName", &[] as &[&str]).unwrap();
//! assert!(wildcard.is_wildcard());
//! ```

use crate::error::{Error, Result};
use crate::kind::Kind;
use serde::Serialize;
use std::fmt;

/// A declared parameter: name and type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub kind: Kind,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Parsed method signature
///
/// Built once at registration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    name: String,
    /// `None` when the signature had no parameter list at all
    params: Option<Vec<Param>>,
    returns: Kind,
}

impl MethodSignature {
    /// Signature for a bare method name: any params, returns `Any`
    pub fn wildcard(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
            returns: Kind::Any,
        }
    }

    /// Signature with an explicit parameter list
    pub fn new(name: impl Into<String>, params: Vec<Param>, returns: Kind) -> Self {
        Self {
            name: name.into(),
            params: Some(params),
            returns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters in positional order (empty for a wildcard)
    pub fn params(&self) -> &[Param] {
        self.params.as_deref().unwrap_or(&[])
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params().iter().map(|p| p.name.as_str()).collect()
    }

    pub fn returns(&self) -> Kind {
        self.returns
    }

    /// True when the signature declared no parameter list, so calls are
    /// accepted with any params
    pub fn is_wildcard(&self) -> bool {
        self.params.is_none()
    }

    /// Look up a declared parameter by name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params().iter().find(|p| p.name == name)
    }
}

impl fmt::Display for MethodSignature {
    /// Canonical form, e.g. `m(a=String, b=String) -> Object`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(params) = &self.params {
            let rendered: Vec<String> = params
                .iter()
                .map(|p| format!("{}={}", p.name, p.kind))
                .collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        write!(f, " -> {}", self.returns)
    }
}

/// Parse a signature string
///
/// `positional_names` supplies names for bare (positional) type tokens, in
/// order; tokens beyond the hint are auto-named `a`, `b`, `c`, ...
///
/// # Errors
///
/// Returns [`Error::InvalidSignature`] when the text does not follow the
/// grammar, when a parameter or return type token is unknown, when a bare
/// type follows a named parameter, or when a parameter name repeats.
pub fn parse_signature<S: AsRef<str>>(text: &str, positional_names: &[S]) -> Result<MethodSignature> {
    let fail = |reason: String| Error::invalid_signature(text, reason);

    let trimmed = text.trim();
    let name_len = trimmed
        .find(|c: char| !is_method_name_char(c))
        .unwrap_or(trimmed.len());
    let name = &trimmed[..name_len];
    if name.is_empty() {
        return Err(fail("missing method name".to_string()));
    }

    let mut rest = trimmed[name_len..].trim_start();

    let params = if let Some(after_open) = rest.strip_prefix('(') {
        let close = after_open
            .find(')')
            .ok_or_else(|| fail("unclosed parameter list".to_string()))?;
        let list = &after_open[..close];
        rest = after_open[close + 1..].trim_start();
        Some(parse_params(list, positional_names).map_err(fail)?)
    } else {
        None
    };

    let returns = if rest.is_empty() {
        Kind::Any
    } else if let Some(ret) = rest.strip_prefix("->") {
        let token = ret.trim();
        if token.is_empty() {
            return Err(fail("missing return type after `->`".to_string()));
        }
        if !token.chars().all(is_ident_char) {
            return Err(fail(format!("invalid return type `{}`", token)));
        }
        Kind::decode(token).map_err(|_| fail(format!("unknown return type `{}`", token)))?
    } else {
        return Err(fail(format!("unexpected input `{}`", rest)));
    };

    Ok(MethodSignature {
        name: name.to_string(),
        params,
        returns,
    })
}

fn parse_params<S: AsRef<str>>(
    list: &str,
    positional_names: &[S],
) -> std::result::Result<Vec<Param>, String> {
    if list.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut params: Vec<Param> = Vec::new();
    let mut seen_named = false;

    for (index, item) in list.split(',').enumerate() {
        let item = item.trim();
        if item.is_empty() {
            return Err(format!("empty parameter at position {}", index));
        }

        let param = match item.split_once('=') {
            Some((name, ty)) => {
                seen_named = true;
                let name = name.trim();
                if name.is_empty() || !name.chars().all(is_ident_char) {
                    return Err(format!("invalid parameter name in `{}`", item));
                }
                Param::new(name, decode_param_type(ty.trim())?)
            }
            None => {
                if seen_named {
                    return Err(format!(
                        "positional parameter `{}` follows a named parameter",
                        item
                    ));
                }
                let name = positional_names
                    .get(index)
                    .map(|n| n.as_ref().to_string())
                    .unwrap_or_else(|| auto_name(index));
                Param::new(name, decode_param_type(item)?)
            }
        };

        if params.iter().any(|p| p.name == param.name) {
            return Err(format!("duplicate parameter `{}`", param.name));
        }
        params.push(param);
    }

    Ok(params)
}

fn decode_param_type(token: &str) -> std::result::Result<Kind, String> {
    if token.is_empty() || !token.chars().all(is_ident_char) {
        return Err(format!("invalid parameter type `{}`", token));
    }
    Kind::decode(token).map_err(|_| format!("unknown parameter type `{}`", token))
}

/// `a`, `b`, ..., `z`, `aa`, `ab`, ...
fn auto_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn is_method_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Kind)]) -> Vec<Param> {
        pairs.iter().map(|(n, k)| Param::new(*n, *k)).collect()
    }

    fn hint_of(expected: &[(&str, Kind)]) -> Vec<String> {
        expected.iter().map(|(n, _)| n.to_string()).collect()
    }

    #[test]
    fn test_working_signatures() {
        let cases: Vec<(&str, &str, Option<Vec<(&str, Kind)>>, Kind)> = vec![
            ("jsonrpc", "jsonrpc", None, Kind::Any),
            ("jsonrpc.methodName", "jsonrpc.methodName", None, Kind::Any),
            ("jsonrpc.methodName() -> list", "jsonrpc.methodName", Some(vec![]), Kind::Array),
            (
                "jsonrpc.methodName(str, str, str ) ",
                "jsonrpc.methodName",
                Some(vec![("a", Kind::String), ("b", Kind::String), ("c", Kind::String)]),
                Kind::Any,
            ),
            (
                "jsonrpc.methodName(str, b=str, c=str)",
                "jsonrpc.methodName",
                Some(vec![("a", Kind::String), ("b", Kind::String), ("c", Kind::String)]),
                Kind::Any,
            ),
            (
                "jsonrpc.methodName(str, b=str) -> dict",
                "jsonrpc.methodName",
                Some(vec![("a", Kind::String), ("b", Kind::String)]),
                Kind::Object,
            ),
            (
                "jsonrpc.methodName(str, str, c=Any) -> Any",
                "jsonrpc.methodName",
                Some(vec![("a", Kind::String), ("b", Kind::String), ("c", Kind::Any)]),
                Kind::Any,
            ),
            ("jsonrpc(Any ) ->  Any", "jsonrpc", Some(vec![("a", Kind::Any)]), Kind::Any),
        ];

        for (text, name, expected, returns) in cases {
            let hint = expected.as_deref().map(hint_of).unwrap_or_default();
            let sig = parse_signature(text, &hint)
                .unwrap_or_else(|e| panic!("{} failed to parse: {}", text, e));
            assert_eq!(sig.name(), name, "{}", text);
            assert_eq!(sig.returns(), returns, "{}", text);
            match expected {
                None => assert!(sig.is_wildcard(), "{}", text),
                Some(expected) => {
                    assert!(!sig.is_wildcard(), "{}", text);
                    assert_eq!(sig.params(), params(&expected).as_slice(), "{}", text);
                }
            }
        }
    }

    #[test]
    fn test_error_signatures() {
        let cases = [
            "jsonrpc(str) -> nowai",
            "jsonrpc(nowai) -> Any",
            "jsonrpc(nowai=str, str)",
            "jsonrpc.methodName(nowai*str) -> Any",
            "jsonrpc(str",
            "jsonrpc(str,,str)",
            "jsonrpc(str) garbage",
            "jsonrpc(str) ->",
            "(str) -> Any",
            "jsonrpc(a=str, a=int)",
            "jsonrpc(=str)",
        ];
        for text in cases {
            match parse_signature(text, &["a"]) {
                Err(Error::InvalidSignature { signature, .. }) => assert_eq!(signature, text),
                other => panic!("{} should fail, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_auto_names_without_hint() {
        let sig = parse_signature("m(str, b=str) -> dict", &[] as &[&str]).unwrap();
        assert_eq!(sig.param_names(), vec!["a", "b"]);
        assert_eq!(sig.params()[0].kind, Kind::String);
        assert_eq!(sig.returns(), Kind::Object);
    }

    #[test]
    fn test_hint_names_positional_params() {
        let sig = parse_signature("jsonrpc.echo(String, String)", &["string", "string2"]).unwrap();
        assert_eq!(sig.param_names(), vec!["string", "string2"]);

        // Hint shorter than the list: remaining names are generated
        let sig = parse_signature("jsonrpc.echo(String, String, int)", &["first"]).unwrap();
        assert_eq!(sig.param_names(), vec!["first", "b", "c"]);
    }

    #[test]
    fn test_positional_after_named_message() {
        let err = parse_signature("m(nowai=str, str)", &[] as &[&str]).unwrap_err();
        assert!(err.to_string().contains("follows a named parameter"));
    }

    #[test]
    fn test_return_and_param_errors_are_distinguishable() {
        let ret = parse_signature("jsonrpc(str) -> nowai", &[] as &[&str]).unwrap_err();
        let param = parse_signature("jsonrpc(nowai) -> Any", &[] as &[&str]).unwrap_err();
        assert!(ret.to_string().contains("return type"));
        assert!(param.to_string().contains("parameter type"));
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        let a = parse_signature("m ( s = str ,  t=int )->  bool", &[] as &[&str]).unwrap();
        let b = parse_signature("m(s=str,t=int)->bool", &[] as &[&str]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_list_is_not_wildcard() {
        let sig = parse_signature("jsonrpc.tuple() -> Array", &[] as &[&str]).unwrap();
        assert!(!sig.is_wildcard());
        assert!(sig.params().is_empty());
    }

    #[test]
    fn test_display() {
        let sig = parse_signature("m(str, b=dict) -> list", &[] as &[&str]).unwrap();
        assert_eq!(sig.to_string(), "m(a=String, b=Object) -> Array");
        assert_eq!(
            parse_signature(&sig.to_string(), &[] as &[&str]).unwrap(),
            sig
        );
        assert_eq!(MethodSignature::wildcard("ping").to_string(), "ping -> Any");
    }

    #[test]
    fn test_auto_name_sequence() {
        assert_eq!(auto_name(0), "a");
        assert_eq!(auto_name(25), "z");
        assert_eq!(auto_name(26), "aa");
        assert_eq!(auto_name(27), "ab");
    }
}
