//! Parameter and return value validation
//!
//! Checks only run for methods registered with `validate`. For the rest,
//! params flow to the handler untouched.
//!
//! Rules for params:
//! - positional: length must equal the declared count, and each value must
//!   match the type declared at its position
//! - named: every declared name must be present with a matching value;
//!   extra keys are tolerated
//! - a signature without a parameter list accepts anything
//!
//! A result that does not match the declared return type is an internal
//! error: the server broke its own promise, the caller did nothing wrong.

use crate::registry::RegisteredMethod;
use jreg_core::{Error, Kind, Params, Result};
use serde_json::Value;

/// Check call params against the method signature
pub fn validate_params(method: &RegisteredMethod, params: &Params) -> Result<()> {
    if !method.validate || method.signature.is_wildcard() {
        return Ok(());
    }

    let declared = method.signature.params();

    match params {
        Params::Positional(values) => {
            if values.len() != declared.len() {
                return Err(Error::InvalidParams(format!(
                    "{} takes {} argument(s), {} given",
                    method.name(),
                    declared.len(),
                    values.len()
                )));
            }
            for (position, (param, value)) in declared.iter().zip(values).enumerate() {
                if !param.kind.matches(value) {
                    return Err(type_mismatch(method, &param.name, param.kind, value, Some(position)));
                }
            }
        }
        Params::Named(map) => {
            for param in declared {
                let value = map.get(&param.name).ok_or_else(|| {
                    Error::InvalidParams(format!(
                        "{} missing required argument `{}`",
                        method.name(),
                        param.name
                    ))
                })?;
                if !param.kind.matches(value) {
                    return Err(type_mismatch(method, &param.name, param.kind, value, None));
                }
            }
        }
    }

    Ok(())
}

/// Check a handler result against the declared return type
pub fn validate_return(method: &RegisteredMethod, result: &Value) -> Result<()> {
    if !method.validate {
        return Ok(());
    }

    let declared = method.signature.returns();
    if declared.matches(result) {
        Ok(())
    } else {
        Err(Error::Internal(format!(
            "{} returned {}, declared {}",
            method.name(),
            Kind::of(result),
            declared
        )))
    }
}

fn type_mismatch(
    method: &RegisteredMethod,
    name: &str,
    declared: Kind,
    value: &Value,
    position: Option<usize>,
) -> Error {
    let location = match position {
        Some(p) => format!("argument {} (`{}`)", p, name),
        None => format!("argument `{}`", name),
    };
    Error::InvalidParams(format!(
        "{} {} must be {}, got {}",
        method.name(),
        location,
        declared,
        Kind::of(value)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::registry::{MethodOptions, Registry};
    use serde_json::json;

    fn method(signature: &str, options: MethodOptions) -> std::sync::Arc<RegisteredMethod> {
        let mut registry = Registry::new();
        let handler = from_fn(|_ctx, _params| async { Ok(Value::Null) });
        registry.register(signature, handler, options).unwrap();
        registry.methods().remove(0)
    }

    fn named(value: Value) -> Params {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_args() {
        let m = method("jsonrpc(String, String) -> String", MethodOptions::new().validate());
        assert!(validate_params(&m, &Params::from(vec![json!("omg"), json!("wtf")])).is_ok());

        let err = validate_params(&m, &Params::from(vec![json!(["omg"]), json!(["wtf"])])).unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }

    #[test]
    fn test_validate_args_any() {
        let m = method("jsonrpc(s1=Any, s2=Any)", MethodOptions::new().validate());
        assert!(validate_params(&m, &Params::from(vec![json!("omg"), json!("wtf")])).is_ok());
        assert!(validate_params(&m, &Params::from(vec![json!(["omg"]), json!(["wtf"])])).is_ok());
        assert!(validate_params(&m, &named(json!({"s1": "omg", "s2": "wtf"}))).is_ok());
    }

    #[test]
    fn test_arity_mismatch() {
        let m = method("jsonrpc(String, String)", MethodOptions::new().validate());
        let err = validate_params(&m, &Params::from(vec![json!("a"), json!("b"), json!("c")])).unwrap_err();
        assert!(err.to_string().contains("takes 2 argument(s), 3 given"));
    }

    #[test]
    fn test_empty_list_requires_zero_args() {
        let m = method("jsonrpc.tuple() -> Array", MethodOptions::new().validate());
        assert!(validate_params(&m, &Params::default()).is_ok());
        assert!(validate_params(&m, &Params::from(vec![json!(1)])).is_err());
    }

    #[test]
    fn test_wildcard_accepts_any_arity() {
        let m = method("jsonrpc.anything", MethodOptions::new().validate());
        assert!(validate_params(&m, &Params::from(vec![json!(1), json!(2), json!(3)])).is_ok());
        assert!(validate_params(&m, &named(json!({"x": 1}))).is_ok());
    }

    #[test]
    fn test_named_missing_and_mismatched() {
        let m = method("jsonrpc.checkedEcho(string=str, string2=str) -> str", MethodOptions::new().validate());

        assert!(validate_params(&m, &named(json!({"string": "a", "string2": "b"}))).is_ok());
        // extra keys are tolerated
        assert!(validate_params(&m, &named(json!({"string": "a", "string2": "b", "x": 1}))).is_ok());

        let missing = validate_params(&m, &named(json!({"string": "a"}))).unwrap_err();
        assert!(missing.to_string().contains("string2"));

        let mismatched = validate_params(&m, &named(json!({"string": "a", "string2": 5}))).unwrap_err();
        assert!(mismatched.to_string().contains("must be String, got Number"));
    }

    #[test]
    fn test_objects_and_arrays_are_strict() {
        let m = method("jsonrpc.authCheckedEcho(Object, Array) -> Object", MethodOptions::new().validate());
        assert!(validate_params(&m, &Params::from(vec![json!({"a": 1}), json!([1])])).is_ok());
        assert!(validate_params(&m, &Params::from(vec![json!([1]), json!({"a": 1})])).is_err());
    }

    #[test]
    fn test_no_validation_is_noop() {
        let m = method("jsonrpc(String, String) -> String", MethodOptions::new());
        assert!(validate_params(&m, &Params::from(vec![json!(1)])).is_ok());
        assert!(validate_return(&m, &json!(1)).is_ok());
    }

    #[test]
    fn test_return_validation_is_internal_error() {
        let m = method("jsonrpc.checkedReturnEcho() -> String", MethodOptions::new().validate());
        assert!(validate_return(&m, &json!("omgwtf")).is_ok());

        let err = validate_return(&m, &json!(["omg"])).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.to_error_data().code, -32603);
    }
}
