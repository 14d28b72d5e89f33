//! Pure coercion and constraint checks, one function per field kind.

use crate::{ConfigValue, Constraints, FieldKind, FieldSpec};
use serde_json::Value;

/// Coerce a raw value to the declared kind, then check its constraints.
///
/// The error is a human-readable reason suitable for a violation report.
pub(crate) fn coerce_field(spec: &FieldSpec, raw: &Value) -> Result<ConfigValue, String> {
    let value = coerce_kind(spec.kind, raw)?;
    check_constraints(&value, &spec.constraints)?;
    Ok(value)
}

fn coerce_kind(kind: FieldKind, raw: &Value) -> Result<ConfigValue, String> {
    match kind {
        FieldKind::String | FieldKind::Choice => coerce_string(raw).map(ConfigValue::String),
        FieldKind::Integer => coerce_integer(raw).map(ConfigValue::Integer),
        FieldKind::Float => coerce_float(raw).map(ConfigValue::Float),
        FieldKind::Boolean => coerce_bool(raw).map(ConfigValue::Boolean),
        FieldKind::StringList => coerce_list(raw, coerce_string).map(ConfigValue::StringList),
        FieldKind::IntegerList => coerce_list(raw, coerce_integer).map(ConfigValue::IntegerList),
        FieldKind::FloatList => coerce_list(raw, coerce_float).map(ConfigValue::FloatList),
    }
}

fn coerce_string(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(value) => Ok(value.clone()),
        other => Err(wrong_type(other, "string")),
    }
}

fn coerce_integer(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                return Ok(value);
            }
            match number.as_f64() {
                // `i64::MAX as f64` rounds up to 2^63, which is out of range.
                Some(value)
                    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 =>
                {
                    Ok(value as i64)
                }
                _ => Err(wrong_type(raw, "integer")),
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| wrong_type(raw, "integer")),
        other => Err(wrong_type(other, "integer")),
    }
}

fn coerce_float(raw: &Value) -> Result<f64, String> {
    let value = match raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(wrong_type(raw, "float")),
    }
}

fn coerce_bool(raw: &Value) -> Result<bool, String> {
    match raw {
        Value::Bool(value) => Ok(*value),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(wrong_type(raw, "boolean")),
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(wrong_type(raw, "boolean")),
        },
        other => Err(wrong_type(other, "boolean")),
    }
}

/// A lone scalar is accepted as a one-element list.
fn coerce_list<T>(raw: &Value, element: fn(&Value) -> Result<T, String>) -> Result<Vec<T>, String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| element(item).map_err(|reason| format!("element {idx}: {reason}")))
            .collect(),
        Value::Object(_) | Value::Null => Err(wrong_type(raw, "list")),
        scalar => Ok(vec![element(scalar)?]),
    }
}

fn check_constraints(value: &ConfigValue, constraints: &Constraints) -> Result<(), String> {
    match value {
        ConfigValue::Integer(number) => check_range(value, *number as f64, constraints)?,
        ConfigValue::Float(number) => check_range(value, *number, constraints)?,
        ConfigValue::String(text) => check_length(value, text.chars().count(), constraints)?,
        ConfigValue::StringList(items) => check_length(value, items.len(), constraints)?,
        ConfigValue::IntegerList(items) => check_length(value, items.len(), constraints)?,
        ConfigValue::FloatList(items) => check_length(value, items.len(), constraints)?,
        ConfigValue::Boolean(_) => {}
    }

    let Some(allowed) = constraints.allowed.as_deref() else {
        return Ok(());
    };
    let elements: Vec<ConfigValue> = match value {
        ConfigValue::StringList(items) => items.iter().cloned().map(ConfigValue::String).collect(),
        ConfigValue::IntegerList(items) => items.iter().copied().map(ConfigValue::Integer).collect(),
        ConfigValue::FloatList(items) => items.iter().copied().map(ConfigValue::Float).collect(),
        scalar => vec![scalar.clone()],
    };
    for element in &elements {
        if !allowed.contains(element) {
            let choices = allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(format!(
                "the value \"{element}\" is unacceptable (allowed: {choices})"
            ));
        }
    }
    Ok(())
}

fn check_range(value: &ConfigValue, number: f64, constraints: &Constraints) -> Result<(), String> {
    if let Some(min) = constraints.min {
        if number < min {
            return Err(format!("the value \"{value}\" is too small (minimum {min})"));
        }
    }
    if let Some(max) = constraints.max {
        if number > max {
            return Err(format!("the value \"{value}\" is too big (maximum {max})"));
        }
    }
    Ok(())
}

fn check_length(value: &ConfigValue, len: usize, constraints: &Constraints) -> Result<(), String> {
    let len = len as f64;
    if let Some(min) = constraints.min {
        if len < min {
            return Err(format!("the value \"{value}\" is too short (minimum length {min})"));
        }
    }
    if let Some(max) = constraints.max {
        if len > max {
            return Err(format!("the value \"{value}\" is too long (maximum length {max})"));
        }
    }
    Ok(())
}

fn wrong_type(raw: &Value, expected: &str) -> String {
    let shown = match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    format!("the value \"{shown}\" is of the wrong type (expected {expected})")
}

/// Short description of a raw value's shape.
pub(crate) fn describe_raw(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a section",
    }
}
