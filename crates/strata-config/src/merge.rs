//! Deep merge of validated config layers.

use crate::{ConfigTree, Entry, Field, Section};

/// Merge `overlay` into `base` in place.
///
/// Only fields the overlay source set explicitly replace base values;
/// defaulted and unset fields leave the base untouched. Both trees come from
/// the same schema, so no coercion or constraint check happens here.
pub fn merge(base: &mut ConfigTree, overlay: &ConfigTree) {
    merge_sections(base.root_mut(), overlay.root());
}

fn merge_sections(base: &mut Section, overlay: &Section) {
    if overlay.is_explicit() {
        base.mark_explicit();
    }
    for (key, entry) in overlay.iter() {
        match (base.get_mut(key), entry) {
            (Some(Entry::Section(base_section)), Entry::Section(overlay_section)) => {
                merge_sections(base_section, overlay_section);
            }
            (Some(Entry::Field(slot)), Entry::Field(Field::Explicit(value))) => {
                *slot = Field::Explicit(value.clone());
            }
            (Some(Entry::Field(slot @ Field::Unset)), Entry::Field(Field::Default(value))) => {
                *slot = Field::Default(value.clone());
            }
            (None, entry) => {
                base.insert(key.clone(), entry.clone());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigValue, Schema, validate_layer};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::parse(
            r#"{
                name: { type: "string", default: "sim" },
                grid: {
                    size: { type: "integer", default: 128 },
                    step: { type: "float", default: 0.5 },
                    seed: { type: "integer" },
                },
            }"#,
        )
        .expect("schema")
    }

    fn layer(schema: &Schema, raw: serde_json::Value) -> ConfigTree {
        validate_layer(&raw, schema).expect("layer")
    }

    fn value<'a>(tree: &'a ConfigTree, keys: &str) -> Option<&'a ConfigValue> {
        tree.get_nested(keys).ok().and_then(|node| node.as_value())
    }

    /// Later layers win for the fields they set; others keep earlier values.
    #[test]
    fn later_layer_wins_only_for_present_fields() {
        let schema = schema();
        let mut merged = layer(&schema, json!({}));
        merge(&mut merged, &layer(&schema, json!({ "grid": { "size": 256, "seed": 7 } })));
        merge(&mut merged, &layer(&schema, json!({ "grid": { "step": 0.25 } })));

        assert_eq!(value(&merged, "grid/size"), Some(&ConfigValue::Integer(256)));
        assert_eq!(value(&merged, "grid/seed"), Some(&ConfigValue::Integer(7)));
        assert_eq!(value(&merged, "grid/step"), Some(&ConfigValue::Float(0.25)));
        assert_eq!(
            value(&merged, "name"),
            Some(&ConfigValue::String("sim".to_string()))
        );
    }

    /// A defaulted field in the overlay does not reset an earlier explicit value.
    #[test]
    fn defaults_do_not_override_explicit_values() {
        let schema = schema();
        let mut merged = layer(&schema, json!({ "name": "custom" }));
        merge(&mut merged, &layer(&schema, json!({ "grid": { "size": 64 } })));
        assert_eq!(
            value(&merged, "name"),
            Some(&ConfigValue::String("custom".to_string()))
        );
    }

    /// Merging the same layer twice in a row changes nothing the second time.
    #[test]
    fn merge_is_idempotent() {
        let schema = schema();
        let overlay = layer(&schema, json!({ "name": "twice", "grid": { "seed": 3 } }));
        let mut merged = layer(&schema, json!({}));
        merge(&mut merged, &overlay);
        let once = merged.clone();
        merge(&mut merged, &overlay);
        assert_eq!(merged, once);
    }

    /// Merging keeps the schema's shape.
    #[test]
    fn merge_preserves_shape() {
        let schema = schema();
        let mut merged = layer(&schema, json!({}));
        merge(&mut merged, &layer(&schema, json!({ "grid": { "size": 1 }, "extra": true })));
        assert_eq!(merged.root().len(), 2);
        assert!(merged.root().get("extra").is_none());
    }
}
