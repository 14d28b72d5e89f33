//! Parsing of individual JSON5 schema fragments.
//!
//! An object whose `type` key holds a string is a field declaration; any
//! other object is a section. A bare string is shorthand for a declaration
//! with only a type.

use super::{Constraints, FieldKind, FieldSpec, SchemaEntry, SchemaFragment, SchemaSection, join_path};
use crate::SchemaError;
use crate::validate::coerce_field;
use serde_json::{Map, Value};

/// Marks a section that some layer must provide.
const REQUIRED_KEY: &str = "$required";

/// Keys accepted inside a field declaration.
const DECLARATION_KEYS: &[&str] = &[
    "type",
    "default",
    "min",
    "max",
    "choices",
    "allowed",
    "description",
];

/// Parse one fragment into a schema section rooted at the fragment top.
pub(super) fn parse_fragment(fragment: &SchemaFragment) -> Result<SchemaSection, SchemaError> {
    let value: Value = json5::from_str(&fragment.text).map_err(|source| SchemaError::Parse {
        fragment: fragment.name.clone(),
        source,
    })?;
    let map = expect_object(&value, &fragment.name, "")?;
    parse_section(map, &fragment.name, "")
}

fn parse_section(
    map: &Map<String, Value>,
    fragment: &str,
    path: &str,
) -> Result<SchemaSection, SchemaError> {
    let mut section = SchemaSection::default();
    for (key, value) in map {
        let entry_path = join_path(path, key);
        if key == REQUIRED_KEY {
            section.required = value
                .as_bool()
                .ok_or_else(|| invalid_declaration(fragment, &entry_path, "expected bool"))?;
            continue;
        }
        let entry = match value {
            Value::Object(inner) if is_declaration(inner) => {
                SchemaEntry::Field(parse_field(inner, fragment, &entry_path)?)
            }
            Value::Object(inner) => SchemaEntry::Section(parse_section(inner, fragment, &entry_path)?),
            Value::String(kind) => SchemaEntry::Field(FieldSpec::new(parse_kind(
                kind,
                fragment,
                &entry_path,
            )?)),
            _ => {
                return Err(invalid_declaration(
                    fragment,
                    &entry_path,
                    "expected a field declaration or a section",
                ));
            }
        };
        section.entries.insert(key.clone(), entry);
    }
    Ok(section)
}

fn is_declaration(map: &Map<String, Value>) -> bool {
    matches!(map.get("type"), Some(Value::String(_)))
}

fn parse_field(
    map: &Map<String, Value>,
    fragment: &str,
    path: &str,
) -> Result<FieldSpec, SchemaError> {
    ensure_allowed_keys(map, DECLARATION_KEYS, fragment, path)?;

    let kind = match map.get("type") {
        Some(Value::String(name)) => parse_kind(name, fragment, path)?,
        _ => return Err(invalid_declaration(fragment, path, "missing field type")),
    };

    let min = optional_number(map, "min", fragment, path)?;
    let max = optional_number(map, "max", fragment, path)?;
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(invalid_declaration(
                fragment,
                path,
                &format!("min {min} is greater than max {max}"),
            ));
        }
    }

    let allowed = match (map.get("choices"), map.get("allowed")) {
        (Some(_), Some(_)) => {
            return Err(invalid_declaration(
                fragment,
                path,
                "use either choices or allowed, not both",
            ));
        }
        (Some(raw), None) | (None, Some(raw)) => Some(parse_allowed(raw, kind, fragment, path)?),
        (None, None) => None,
    };
    if kind == FieldKind::Choice && allowed.as_ref().is_none_or(Vec::is_empty) {
        return Err(invalid_declaration(
            fragment,
            path,
            "option fields require a non-empty choices list",
        ));
    }

    let description = match map.get("description") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => return Err(invalid_declaration(fragment, path, "expected string description")),
        None => None,
    };

    let mut spec = FieldSpec::new(kind).with_constraints(Constraints { min, max, allowed });
    spec.description = description;

    // `null` means "no default", same as omitting the key.
    if let Some(raw) = map.get("default").filter(|raw| !raw.is_null()) {
        let default = coerce_field(&spec, raw).map_err(|reason| {
            invalid_declaration(fragment, path, &format!("invalid default: {reason}"))
        })?;
        spec.default = Some(default);
    }
    Ok(spec)
}

fn parse_kind(name: &str, fragment: &str, path: &str) -> Result<FieldKind, SchemaError> {
    FieldKind::from_name(name).ok_or_else(|| {
        invalid_declaration(fragment, path, &format!("unknown field type \"{name}\""))
    })
}

fn parse_allowed(
    raw: &Value,
    kind: FieldKind,
    fragment: &str,
    path: &str,
) -> Result<Vec<crate::ConfigValue>, SchemaError> {
    let Value::Array(items) = raw else {
        return Err(invalid_declaration(fragment, path, "expected array of choices"));
    };
    // Choices are stored as plain element values; the choice kind itself is a string.
    let element = match kind.element_kind() {
        FieldKind::Choice => FieldKind::String,
        other => other,
    };
    let element_spec = FieldSpec::new(element);
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            coerce_field(&element_spec, item).map_err(|reason| {
                invalid_declaration(fragment, &format!("{path}[{idx}]"), &reason)
            })
        })
        .collect()
}

fn optional_number(
    map: &Map<String, Value>,
    key: &str,
    fragment: &str,
    path: &str,
) -> Result<Option<f64>, SchemaError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid_declaration(fragment, &join_path(path, key), "expected number")),
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    fragment: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, SchemaError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_declaration(fragment, path, "expected object")),
    }
}

/// Ensure a declaration contains only known keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    fragment: &str,
    path: &str,
) -> Result<(), SchemaError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_declaration(
                fragment,
                &join_path(path, key),
                "unknown declaration key",
            ));
        }
    }
    Ok(())
}

/// Build a structured invalid-declaration error.
fn invalid_declaration(fragment: &str, path: &str, message: &str) -> SchemaError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    SchemaError::InvalidDeclaration {
        fragment: fragment.to_string(),
        path: normalized_path.to_string(),
        message: message.to_string(),
    }
}
