//! Tests for schema fragment parsing and merging.

use super::*;
use pretty_assertions::assert_eq;

fn fragment(name: &str, text: &str) -> SchemaFragment {
    SchemaFragment::new(name, text)
}

/// Declarations, shorthand kinds and nested sections parse into the tree.
#[test]
fn parses_fields_and_sections() {
    let schema = Schema::parse(
        r#"{
            frequency: {
                type: { type: "option", choices: ["custom", "calc"], default: "calc" },
                start: { type: "float", default: 60, min: 0 },
                frequencies: "float_list",
            },
            verbose: { type: "boolean", default: false },
        }"#,
    )
    .expect("schema");

    let kind = schema.field(&["frequency", "type"]).expect("type field");
    assert_eq!(kind.kind, FieldKind::Choice);
    assert_eq!(kind.default, Some(ConfigValue::String("calc".into())));

    let start = schema.field(&["frequency", "start"]).expect("start field");
    assert_eq!(start.default, Some(ConfigValue::Float(60.0)));
    assert_eq!(start.constraints.min, Some(0.0));

    let list = schema.field(&["frequency", "frequencies"]).expect("list field");
    assert_eq!(list.kind, FieldKind::FloatList);
    assert_eq!(list.default, None);

    assert_eq!(schema.root().field_count(), 4);
    assert!(schema.field(&["frequency"]).is_none());
}

/// `$required` marks a section as required.
#[test]
fn required_sections() {
    let schema = Schema::parse(r#"{ sky: { $required: true, nside: "integer" } }"#).expect("schema");
    match schema.root().get("sky") {
        Some(SchemaEntry::Section(section)) => assert!(section.required),
        other => panic!("expected section, got {other:?}"),
    }
}

/// Fragments are merged in name order and may extend each other's sections.
#[test]
fn merges_fragments_by_name() {
    let schema = Schema::from_fragments([
        fragment("20-logging.json5", r#"{ logging: { level: { type: "string", default: "INFO" } } }"#),
        fragment("10-core.json5", r#"{ logging: { format: { type: "string", default: "%(message)s" } } }"#),
    ])
    .expect("schema");
    assert!(schema.field(&["logging", "level"]).is_some());
    assert!(schema.field(&["logging", "format"]).is_some());
}

/// Identical duplicate declarations are tolerated.
#[test]
fn identical_duplicates_are_accepted() {
    let text = r#"{ a: { type: "integer", default: 1 } }"#;
    let schema = Schema::from_fragments([fragment("a", text), fragment("b", text)]).expect("schema");
    assert_eq!(schema.root().field_count(), 1);
}

/// Conflicting kinds or defaults for the same field are rejected.
#[test]
fn conflicting_declarations_are_rejected() {
    let err = Schema::from_fragments([
        fragment("a", r#"{ s: { n: { type: "integer", default: 1 } } }"#),
        fragment("b", r#"{ s: { n: { type: "float", default: 1 } } }"#),
    ])
    .unwrap_err();
    assert!(matches!(err, SchemaError::Conflict { ref path, .. } if path == "s/n"));

    let err = Schema::from_fragments([
        fragment("a", r#"{ n: { type: "integer", default: 1 } }"#),
        fragment("b", r#"{ n: { type: "integer", default: 2 } }"#),
    ])
    .unwrap_err();
    assert!(format!("{err}").contains("default 1"));

    let err = Schema::from_fragments([
        fragment("a", r#"{ n: "integer" }"#),
        fragment("b", r#"{ n: { x: "integer" } }"#),
    ])
    .unwrap_err();
    assert!(format!("{err}").contains("both a section and a field"));
}

/// Malformed fragments surface as schema errors.
#[test]
fn rejects_malformed_fragments() {
    assert!(matches!(
        Schema::parse("{ not json5"),
        Err(SchemaError::Parse { .. })
    ));
    assert!(matches!(
        Schema::parse("[1, 2]"),
        Err(SchemaError::InvalidDeclaration { .. })
    ));
    assert!(matches!(
        Schema::parse(r#"{ n: { type: "complex" } }"#),
        Err(SchemaError::InvalidDeclaration { .. })
    ));
    assert!(matches!(
        Schema::parse(r#"{ n: { type: "integer", step: 2 } }"#),
        Err(SchemaError::InvalidDeclaration { .. })
    ));
    assert!(matches!(
        Schema::parse(r#"{ n: 5 }"#),
        Err(SchemaError::InvalidDeclaration { .. })
    ));
}

/// Defaults must satisfy their own declaration.
#[test]
fn rejects_invalid_defaults() {
    let err = Schema::parse(r#"{ n: { type: "integer", default: "many" } }"#).unwrap_err();
    assert!(format!("{err}").contains("invalid default"));

    let err = Schema::parse(r#"{ n: { type: "integer", default: 50, max: 10 } }"#).unwrap_err();
    assert!(format!("{err}").contains("too big"));

    let err = Schema::parse(r#"{ mode: { type: "option", choices: ["a", "w"], default: "x" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("unacceptable"));
}

/// Option fields need a choices list.
#[test]
fn option_requires_choices() {
    let err = Schema::parse(r#"{ mode: { type: "option" } }"#).unwrap_err();
    assert!(format!("{err}").contains("choices"));
}

/// Inverted bounds are rejected.
#[test]
fn rejects_inverted_bounds() {
    let err = Schema::parse(r#"{ n: { type: "integer", min: 5, max: 1 } }"#).unwrap_err();
    assert!(format!("{err}").contains("greater than max"));
}
