//! Schema model and the loader that assembles it from JSON5 fragments.
//!
//! A schema is a tree of sections holding typed field declarations. Fragments
//! are merged in lexicographic name order so overlapping declarations resolve
//! the same way on every run; declarations that disagree are rejected.

mod parse;

#[cfg(test)]
mod tests;

use crate::{ConfigValue, SchemaError};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// One named piece of schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFragment {
    /// Name used for ordering and error messages.
    pub name: String,
    /// JSON5 contents.
    pub text: String,
}

impl SchemaFragment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a fragment from disk, naming it after its path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    /// A string restricted to the declared choices.
    Choice,
    StringList,
    IntegerList,
    FloatList,
}

impl FieldKind {
    /// Parse the kind name used in schema fragments.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "string" => FieldKind::String,
            "integer" | "int" => FieldKind::Integer,
            "float" => FieldKind::Float,
            "boolean" | "bool" => FieldKind::Boolean,
            "option" => FieldKind::Choice,
            "string_list" => FieldKind::StringList,
            "integer_list" | "int_list" => FieldKind::IntegerList,
            "float_list" => FieldKind::FloatList,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Choice => "option",
            FieldKind::StringList => "string_list",
            FieldKind::IntegerList => "integer_list",
            FieldKind::FloatList => "float_list",
        }
    }

    /// Kind of a single element; scalars are their own element kind.
    pub fn element_kind(self) -> FieldKind {
        match self {
            FieldKind::StringList => FieldKind::String,
            FieldKind::IntegerList => FieldKind::Integer,
            FieldKind::FloatList => FieldKind::Float,
            other => other,
        }
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            FieldKind::StringList | FieldKind::IntegerList | FieldKind::FloatList
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional bounds and allowed-set for a field.
///
/// `min`/`max` bound numeric values, and the length of strings and lists.
/// `allowed` holds element values; every list element must be a member.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed: Option<Vec<ConfigValue>>,
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub default: Option<ConfigValue>,
    pub constraints: Constraints,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            constraints: Constraints::default(),
            description: None,
        }
    }

    pub fn with_default(mut self, default: ConfigValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Declarations agree when kind, default and constraints match.
    fn same_declaration(&self, other: &FieldSpec) -> bool {
        self.kind == other.kind
            && self.default == other.default
            && self.constraints == other.constraints
    }

    fn describe(&self) -> String {
        match &self.default {
            Some(default) => format!("{} (default {default})", self.kind),
            None => format!("{} (no default)", self.kind),
        }
    }
}

/// Either a nested section or a field declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    Section(SchemaSection),
    Field(FieldSpec),
}

/// A named group of declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaSection {
    /// Whether some layer must mention this section.
    pub required: bool,
    pub entries: BTreeMap<String, SchemaEntry>,
}

impl SchemaSection {
    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    /// Number of field declarations in this section and below.
    pub fn field_count(&self) -> usize {
        self.entries
            .values()
            .map(|entry| match entry {
                SchemaEntry::Section(section) => section.field_count(),
                SchemaEntry::Field(_) => 1,
            })
            .sum()
    }
}

/// The complete schema; immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    root: SchemaSection,
}

impl Schema {
    pub fn from_root(root: SchemaSection) -> Self {
        Self { root }
    }

    /// Merge fragments, sorted by name, into a single schema.
    pub fn from_fragments(
        fragments: impl IntoIterator<Item = SchemaFragment>,
    ) -> Result<Self, SchemaError> {
        let mut fragments: Vec<SchemaFragment> = fragments.into_iter().collect();
        fragments.sort_by(|a, b| a.name.cmp(&b.name));

        let mut root = SchemaSection::default();
        for fragment in &fragments {
            let section = parse::parse_fragment(fragment)?;
            debug!(
                "merging schema fragment (name={}, entries={})",
                fragment.name,
                section.entries.len()
            );
            merge_sections(&mut root, section, "")?;
        }

        let schema = Self { root };
        info!(
            "schema loaded (fragments={}, fields={})",
            fragments.len(),
            schema.root.field_count()
        );
        Ok(schema)
    }

    /// Build from a single in-memory JSON5 text.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        Self::from_fragments([SchemaFragment::new("schema", text)])
    }

    pub fn root(&self) -> &SchemaSection {
        &self.root
    }

    /// Look up a field declaration by its segments.
    pub fn field(&self, keys: &[&str]) -> Option<&FieldSpec> {
        let (last, parents) = keys.split_last()?;
        let mut section = &self.root;
        for key in parents {
            match section.get(key)? {
                SchemaEntry::Section(inner) => section = inner,
                SchemaEntry::Field(_) => return None,
            }
        }
        match section.get(last)? {
            SchemaEntry::Field(spec) => Some(spec),
            SchemaEntry::Section(_) => None,
        }
    }
}

fn merge_sections(
    target: &mut SchemaSection,
    incoming: SchemaSection,
    path: &str,
) -> Result<(), SchemaError> {
    target.required |= incoming.required;
    for (key, entry) in incoming.entries {
        let entry_path = join_path(path, &key);
        match (target.entries.get_mut(&key), entry) {
            (None, entry) => {
                target.entries.insert(key, entry);
            }
            (Some(SchemaEntry::Section(existing)), SchemaEntry::Section(incoming)) => {
                merge_sections(existing, incoming, &entry_path)?;
            }
            (Some(SchemaEntry::Field(existing)), SchemaEntry::Field(incoming)) => {
                if !existing.same_declaration(&incoming) {
                    return Err(SchemaError::Conflict {
                        path: entry_path,
                        message: format!(
                            "declared as {} and as {}",
                            existing.describe(),
                            incoming.describe()
                        ),
                    });
                }
            }
            (Some(_), _) => {
                return Err(SchemaError::Conflict {
                    path: entry_path,
                    message: "declared as both a section and a field".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Join nested paths for error messages.
pub(crate) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}
