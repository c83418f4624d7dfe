//! Argument validation and coercion against a capability's schema.

use serde_json::Value;

use crate::registry::{Arguments, ParamSchema, ParamSpec, ParamType};
use crate::types::{McpError, McpResult};

/// Check `supplied` against `schema` and return the arguments the handler
/// will see: coerced, defaults applied, unknown keys dropped when lenient.
///
/// An explicit `null` counts as an omitted argument.
pub fn validate_arguments(
    schema: &ParamSchema,
    supplied: &Arguments,
    strict: bool,
) -> McpResult<Arguments> {
    let mut validated = Arguments::new();

    for spec in schema.params() {
        match supplied.get(&spec.name).filter(|v| !v.is_null()) {
            Some(value) => {
                let coerced = coerce(spec, value)?;
                check_bounds(spec, &coerced)?;
                validated.insert(spec.name.clone(), coerced);
            }
            None if spec.required => {
                return Err(McpError::InvalidArguments(format!(
                    "Missing required argument '{}'",
                    spec.name
                )));
            }
            None => {
                if let Some(default) = &spec.default {
                    validated.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }

    for key in supplied.keys() {
        if schema.get(key).is_some() {
            continue;
        }
        if strict {
            return Err(McpError::InvalidArguments(format!("Unknown argument '{key}'")));
        }
        tracing::debug!("Ignoring unknown argument '{key}'");
    }

    Ok(validated)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce(spec: &ParamSpec, value: &Value) -> McpResult<Value> {
    let mismatch = || {
        McpError::InvalidArguments(format!(
            "Argument '{}' must be {}, got {}",
            spec.name,
            spec.ty.json_type(),
            type_name(value)
        ))
    };

    let ok = match spec.ty {
        ParamType::String => value.is_string(),
        ParamType::Number => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Array => value.is_array(),
        ParamType::Object => value.is_object(),
        ParamType::Integer => return coerce_integer(spec, value).ok_or_else(mismatch),
    };

    if ok {
        Ok(value.clone())
    } else {
        Err(mismatch())
    }
}

/// Integers pass; floats pass only with a zero fractional part.
fn coerce_integer(spec: &ParamSpec, value: &Value) -> Option<Value> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(Value::from(i));
    }
    if number.is_u64() {
        tracing::debug!("Argument '{}' exceeds the i64 range", spec.name);
        return None;
    }
    let f = number.as_f64()?;
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    if f.is_finite() && f.fract() == 0.0 && in_range {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn check_bounds(spec: &ParamSpec, value: &Value) -> McpResult<()> {
    let Some(actual) = value.as_f64() else {
        return Ok(());
    };
    if let Some(minimum) = spec.minimum.filter(|&min| actual < min) {
        return Err(McpError::InvalidArguments(format!(
            "Argument '{}' must be at least {minimum}, got {value}",
            spec.name
        )));
    }
    if let Some(maximum) = spec.maximum.filter(|&max| actual > max) {
        return Err(McpError::InvalidArguments(format!(
            "Argument '{}' must be at most {maximum}, got {value}",
            spec.name
        )));
    }
    Ok(())
}
