//! Nested key lookup over a config tree.

use crate::{ConfigError, ConfigNode, ConfigTree, Entry, Section};
use std::fmt;

/// Separator used when a key path is given as a single string.
pub const DEFAULT_SEPARATOR: char = '/';

/// Ordered key segments, one per nesting level.
///
/// Built from a `/`-separated string or from an explicit list of segments.
/// Splitting keeps empty segments, so `""` and `"a//b"` name keys no config
/// can hold. Only an empty segment list addresses the root section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Split `keys` on `sep`.
    pub fn split(keys: &str, sep: char) -> Self {
        Self {
            segments: keys.split(sep).map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&str> for KeyPath {
    fn from(keys: &str) -> Self {
        KeyPath::split(keys, DEFAULT_SEPARATOR)
    }
}

impl From<&String> for KeyPath {
    fn from(keys: &String) -> Self {
        KeyPath::split(keys, DEFAULT_SEPARATOR)
    }
}

impl From<String> for KeyPath {
    fn from(keys: String) -> Self {
        KeyPath::split(&keys, DEFAULT_SEPARATOR)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<Vec<&str>> for KeyPath {
    fn from(segments: Vec<&str>) -> Self {
        KeyPath::from(segments.as_slice())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        KeyPath::from(segments.as_slice())
    }
}

impl ConfigTree {
    /// Single-level lookup in the root section.
    pub fn get(&self, key: &str) -> Option<ConfigNode<'_>> {
        node_of(self.root().get(key)?)
    }

    /// Single-level lookup with a fallback for absent or unset keys.
    pub fn get_or<'a>(&'a self, key: &str, fallback: ConfigNode<'a>) -> ConfigNode<'a> {
        self.get(key).unwrap_or(fallback)
    }

    /// Walk the tree from the root, one segment per level.
    pub fn get_nested(&self, keys: impl Into<KeyPath>) -> Result<ConfigNode<'_>, ConfigError> {
        lookup(self.root(), &keys.into())
    }

    /// Like [`ConfigTree::get_nested`], splitting `keys` on a custom separator.
    pub fn get_nested_sep(&self, keys: &str, sep: char) -> Result<ConfigNode<'_>, ConfigError> {
        lookup(self.root(), &KeyPath::split(keys, sep))
    }

    /// Like [`ConfigTree::get_nested`], returning `sentinel` instead of failing.
    pub fn get_nested_or<'a>(
        &'a self,
        keys: impl Into<KeyPath>,
        sentinel: ConfigNode<'a>,
    ) -> ConfigNode<'a> {
        self.get_nested(keys).unwrap_or(sentinel)
    }
}

fn node_of(entry: &Entry) -> Option<ConfigNode<'_>> {
    match entry {
        Entry::Section(section) => Some(ConfigNode::Section(section)),
        Entry::Field(field) => field.value().map(ConfigNode::Value),
    }
}

/// Re-walks from `root` on every call; there is no partial-path cache.
pub(crate) fn lookup<'a>(root: &'a Section, path: &KeyPath) -> Result<ConfigNode<'a>, ConfigError> {
    let not_found = || ConfigError::KeyNotFound(path.to_string());
    let mut node = ConfigNode::Section(root);
    for key in path.segments() {
        let section = node.as_section().ok_or_else(not_found)?;
        node = section.get(key).and_then(node_of).ok_or_else(not_found)?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigValue, Schema, validate_layer};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tree() -> ConfigTree {
        let schema = Schema::parse(
            r#"{
                a: { b: { c: { type: "integer", default: 3 } }, leaf: { type: "string", default: "x" } },
                top: { type: "boolean", default: true },
                unset: { type: "float" },
            }"#,
        )
        .expect("schema");
        validate_layer(&json!({}), &schema).expect("tree")
    }

    /// String and segment-list paths reach the same value.
    #[test]
    fn string_and_list_paths_agree() {
        let tree = tree();
        let by_string = tree.get_nested("a/b/c").expect("string path");
        let by_list = tree.get_nested(["a", "b", "c"]).expect("list path");
        assert_eq!(by_string, by_list);
        assert_eq!(by_string.as_i64(), Some(3));
    }

    /// Custom separators split the same way.
    #[test]
    fn custom_separator() {
        let tree = tree();
        assert_eq!(tree.get_nested_sep("a.b.c", '.').expect("dotted").as_i64(), Some(3));
    }

    /// Descending through a scalar fails with KeyNotFound.
    #[test]
    fn non_section_intermediate_is_not_found() {
        let tree = tree();
        let err = tree.get_nested("a/leaf/deeper").unwrap_err();
        assert!(matches!(err, ConfigError::KeyNotFound(path) if path == "a/leaf/deeper"));
        assert!(matches!(
            tree.get_nested("missing/key"),
            Err(ConfigError::KeyNotFound(_))
        ));
    }

    /// Unset fields behave like absent keys.
    #[test]
    fn unset_field_is_not_found() {
        let tree = tree();
        assert!(tree.get("unset").is_none());
        assert!(matches!(tree.get_nested("unset"), Err(ConfigError::KeyNotFound(_))));
    }

    /// Fallbacks and sentinels are returned for absent keys only.
    #[test]
    fn fallback_and_sentinel() {
        let tree = tree();
        let fallback = ConfigValue::Integer(-1);
        assert_eq!(tree.get_or("nope", ConfigNode::from(&fallback)).as_i64(), Some(-1));
        assert_eq!(tree.get_or("top", ConfigNode::from(&fallback)).as_bool(), Some(true));
        assert_eq!(
            tree.get_nested_or("a/b/zzz", ConfigNode::from(&fallback)).as_i64(),
            Some(-1)
        );
    }

    /// Sections are returned as nodes too.
    #[test]
    fn section_lookup() {
        let tree = tree();
        let section = tree.get_nested("a/b").expect("section");
        assert!(section.as_section().is_some());
        let root = tree.get_nested(KeyPath::from(Vec::<String>::new())).expect("root");
        assert!(root.as_section().is_some());
    }

    /// Empty segments are looked up literally and never match.
    #[test]
    fn empty_segments_are_not_found() {
        let tree = tree();
        assert_eq!(KeyPath::split("", '/').segments(), [String::new()]);
        for keys in ["", "a//b/c", "/top", "top/"] {
            assert!(
                matches!(tree.get_nested(keys), Err(ConfigError::KeyNotFound(path)) if path == keys),
                "{keys:?}"
            );
        }
    }
}
