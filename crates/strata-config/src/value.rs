//! Typed configuration tree produced by validation and accumulated by merging.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A single coerced config value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    StringList(Vec<String>),
    IntegerList(Vec<i64>),
    FloatList(Vec<f64>),
}

impl ConfigValue {
    /// Borrow the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Integer values only; floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric values widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(value) => Some(*value as f64),
            ConfigValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            ConfigValue::StringList(values) => Some(values),
            _ => None,
        }
    }

    /// Numeric lists widened to `f64`.
    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        match self {
            ConfigValue::FloatList(values) => Some(values.clone()),
            ConfigValue::IntegerList(values) => Some(values.iter().map(|v| *v as f64).collect()),
            _ => None,
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::StringList(_) => "string list",
            ConfigValue::IntegerList(_) => "integer list",
            ConfigValue::FloatList(_) => "float list",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: &[T]) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
        match self {
            ConfigValue::String(value) => write!(f, "{value}"),
            ConfigValue::Integer(value) => write!(f, "{value}"),
            ConfigValue::Float(value) => write!(f, "{value}"),
            ConfigValue::Boolean(value) => write!(f, "{value}"),
            ConfigValue::StringList(values) => write!(f, "[{}]", join(values)),
            ConfigValue::IntegerList(values) => write!(f, "[{}]", join(values)),
            ConfigValue::FloatList(values) => write!(f, "[{}]", join(values)),
        }
    }
}

/// Resolution state of a schema-declared field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    /// No layer provided a value and the schema has no default.
    #[default]
    Unset,
    /// The schema default was substituted.
    Default(ConfigValue),
    /// A source provided the value.
    Explicit(ConfigValue),
}

impl Field {
    pub fn value(&self) -> Option<&ConfigValue> {
        match self {
            Field::Unset => None,
            Field::Default(value) | Field::Explicit(value) => Some(value),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Field::Explicit(_))
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// A node inside a section: either a nested section or a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Section(Section),
    Field(Field),
}

/// Named entries of one section, plus whether a source mentioned it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Section {
    #[serde(skip)]
    explicit: bool,
    #[serde(flatten)]
    entries: BTreeMap<String, Entry>,
}

impl Section {
    pub(crate) fn new(explicit: bool) -> Self {
        Self {
            explicit,
            entries: BTreeMap::new(),
        }
    }

    /// True when at least one source contained this section.
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub(crate) fn mark_explicit(&mut self) {
        self.explicit = true;
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, entry: Entry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated config tree, shaped exactly like the schema it was checked against.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ConfigTree {
    root: Section,
}

impl ConfigTree {
    pub(crate) fn from_root(root: Section) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Section {
        &mut self.root
    }
}

/// Borrowed view of a lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigNode<'a> {
    Section(&'a Section),
    Value(&'a ConfigValue),
}

impl<'a> ConfigNode<'a> {
    pub fn as_section(&self) -> Option<&'a Section> {
        match self {
            ConfigNode::Section(section) => Some(section),
            ConfigNode::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&'a ConfigValue> {
        match self {
            ConfigNode::Value(value) => Some(value),
            ConfigNode::Section(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.as_value().and_then(ConfigValue::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_value().and_then(ConfigValue::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_value().and_then(ConfigValue::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(ConfigValue::as_bool)
    }

    pub fn as_str_list(&self) -> Option<&'a [String]> {
        self.as_value().and_then(ConfigValue::as_str_list)
    }

    pub fn as_f64_list(&self) -> Option<Vec<f64>> {
        self.as_value().and_then(ConfigValue::as_f64_list)
    }
}

impl<'a> From<&'a ConfigValue> for ConfigNode<'a> {
    fn from(value: &'a ConfigValue) -> Self {
        ConfigNode::Value(value)
    }
}

impl<'a> From<&'a Section> for ConfigNode<'a> {
    fn from(section: &'a Section) -> Self {
        ConfigNode::Section(section)
    }
}
