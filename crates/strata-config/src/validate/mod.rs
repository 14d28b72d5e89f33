//! Validation of raw config trees against the schema.
//!
//! Validation never stops at the first problem: every violation in the tree
//! is collected so a single report can list them all.

mod coerce;


pub(crate) use coerce::coerce_field;

use crate::{
    ConfigTree, Entry, Field, Schema, SchemaEntry, SchemaSection, Section, ValidationError,
    Violation,
};
use coerce::describe_raw;
use log::debug;
use serde_json::{Map, Value};

/// How absent values without defaults are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Layer validation: absent fields stay unset and required sections may be omitted.
    Partial,
    /// Standalone validation: absent fields without defaults and missing
    /// required sections are violations.
    Full,
}

/// Validate a complete config tree.
pub fn validate(raw: &Value, schema: &Schema) -> Result<ConfigTree, ValidationError> {
    validate_with_mode(raw, schema, SchemaMode::Full)
}

/// Validate one layer that will be merged over earlier layers.
pub fn validate_layer(raw: &Value, schema: &Schema) -> Result<ConfigTree, ValidationError> {
    validate_with_mode(raw, schema, SchemaMode::Partial)
}

/// Validate a raw tree, producing a tree shaped exactly like the schema.
pub fn validate_with_mode(
    raw: &Value,
    schema: &Schema,
    mode: SchemaMode,
) -> Result<ConfigTree, ValidationError> {
    let mut walker = Walker {
        mode,
        path: Vec::new(),
        violations: Vec::new(),
    };
    let root_map = match raw {
        Value::Object(map) => Some(map),
        Value::Null => None,
        other => {
            walker.violations.push(Violation::failed(
                &[],
                None,
                format!("expected a mapping at the top level, found {}", describe_raw(other)),
            ));
            None
        }
    };
    let mut root = walker.section(schema.root(), root_map, true);
    root.mark_explicit();

    if walker.violations.is_empty() {
        Ok(ConfigTree::from_root(root))
    } else {
        Err(ValidationError {
            violations: walker.violations,
        })
    }
}

/// Report fields no layer has set and required sections no layer mentioned.
pub fn check_complete(tree: &ConfigTree, schema: &Schema) -> Result<(), ValidationError> {
    let mut violations = Vec::new();
    let mut path = Vec::new();
    check_section(schema.root(), Some(tree.root()), &mut path, &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

struct Walker {
    mode: SchemaMode,
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl Walker {
    /// Build the section for `spec` from `raw`; `report_missing` is cleared
    /// below a missing required section so it is reported once.
    fn section(
        &mut self,
        spec: &SchemaSection,
        raw: Option<&Map<String, Value>>,
        report_missing: bool,
    ) -> Section {
        let mut section = Section::new(raw.is_some());
        if let Some(raw) = raw {
            for key in raw.keys().filter(|key| spec.get(key).is_none()) {
                debug!(
                    "ignoring undeclared key (section={}, key={key})",
                    self.display_path()
                );
            }
        }

        for (key, entry) in &spec.entries {
            let raw_value = raw.and_then(|map| map.get(key)).filter(|value| !value.is_null());
            match entry {
                SchemaEntry::Section(inner) => {
                    self.path.push(key.clone());
                    let nested_raw = match raw_value {
                        None => None,
                        Some(Value::Object(map)) => Some(map),
                        Some(other) => {
                            self.violations.push(Violation::failed(
                                &self.path,
                                None,
                                format!("expected a section, found {}", describe_raw(other)),
                            ));
                            None
                        }
                    };
                    let mut report_nested = report_missing;
                    if raw_value.is_none()
                        && inner.required
                        && self.mode == SchemaMode::Full
                        && report_missing
                    {
                        self.violations.push(Violation::missing_section(&self.path));
                        report_nested = false;
                    }
                    let mut nested = self.section(inner, nested_raw, report_nested);
                    if raw_value.is_some() {
                        nested.mark_explicit();
                    }
                    self.path.pop();
                    section.insert(key.clone(), Entry::Section(nested));
                }
                SchemaEntry::Field(field_spec) => {
                    let field = match raw_value {
                        Some(value) => match coerce_field(field_spec, value) {
                            Ok(coerced) => Field::Explicit(coerced),
                            Err(reason) => {
                                self.violations
                                    .push(Violation::failed(&self.path, Some(key.as_str()), reason));
                                Field::Unset
                            }
                        },
                        None => match &field_spec.default {
                            Some(default) => Field::Default(default.clone()),
                            None => {
                                if self.mode == SchemaMode::Full && report_missing {
                                    self.violations.push(Violation::missing_key(&self.path, key));
                                }
                                Field::Unset
                            }
                        },
                    };
                    section.insert(key.clone(), Entry::Field(field));
                }
            }
        }
        section
    }

    fn display_path(&self) -> String {
        if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path.join("/")
        }
    }
}

fn check_section(
    spec: &SchemaSection,
    tree: Option<&Section>,
    path: &mut Vec<String>,
    violations: &mut Vec<Violation>,
) {
    for (key, entry) in &spec.entries {
        let node = tree.and_then(|section| section.get(key));
        match entry {
            SchemaEntry::Section(inner) => {
                path.push(key.clone());
                let nested = match node {
                    Some(Entry::Section(section)) => Some(section),
                    _ => None,
                };
                if inner.required && !nested.is_some_and(Section::is_explicit) {
                    violations.push(Violation::missing_section(path));
                } else {
                    check_section(inner, nested, path, violations);
                }
                path.pop();
            }
            SchemaEntry::Field(_) => {
                let set = matches!(node, Some(Entry::Field(field)) if field.value().is_some());
                if !set {
                    violations.push(Violation::missing_key(path, key));
                }
            }
        }
    }
}
