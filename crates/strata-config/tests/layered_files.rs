//! End-to-end loading from schema fragment files and config files on disk.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use strata_config::{
    ConfigError, ConfigLayerSource, ConfigManager, ConfigSource, SchemaError, SchemaFragment,
    ViolationKind,
};
use tempfile::TempDir;

const FREQUENCY_FRAGMENT: &str = r#"{
    // Frequencies at which maps are produced.
    frequency: {
        type: { type: "option", choices: ["custom", "calc"], default: "calc" },
        start: { type: "float", default: 30, min: 0 },
        stop: { type: "float", default: 90 },
        step: { type: "float", default: 30 },
        frequencies: "float_list",
    },
}"#;

const OUTPUT_FRAGMENT: &str = r#"{
    output: {
        $required: true,
        directory: { type: "string", description: "Where maps are written" },
        overwrite: { type: "boolean", default: false },
    },
}"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write file");
    path
}

fn fragments(dir: &Path) -> Vec<SchemaFragment> {
    [
        write(dir, "20-output.json5", OUTPUT_FRAGMENT),
        write(dir, "10-frequency.json5", FREQUENCY_FRAGMENT),
    ]
    .iter()
    .map(|path| SchemaFragment::from_path(path).expect("fragment"))
    .collect()
}

/// Defaults, an additional layer and a user layer combine in order.
#[test]
fn loads_fragments_and_layers_from_disk() {
    let dir = TempDir::new().expect("tempdir");
    let site = write(
        dir.path(),
        "site.json5",
        r#"{ frequency: { stop: 150, frequencies: [44] }, output: { directory: "/srv/maps" } }"#,
    );
    let user = write(
        dir.path(),
        "user.json5",
        "{\n  // local override\n  output: { directory: 'maps', overwrite: 'yes' },\n}\n",
    );

    let mut manager =
        ConfigManager::load(fragments(dir.path()), [ConfigSource::from(site.clone())])
            .expect("manager");
    manager.read_userconfig(&user).expect("user config");
    manager.check_complete().expect("complete");

    assert_eq!(
        manager.frequencies().expect("frequencies"),
        vec![30.0, 60.0, 90.0, 120.0, 150.0]
    );
    assert_eq!(
        manager.get_nested("output/overwrite").expect("flag").as_bool(),
        Some(true)
    );
    assert_eq!(
        manager.resolve_path("output/directory").expect("path"),
        dir.path().canonicalize().expect("canonical").join("maps")
    );

    let sources: Vec<_> = manager.layers().iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::Default,
            ConfigLayerSource::Additional,
            ConfigLayerSource::User,
        ]
    );
    assert_eq!(manager.layers()[1].path.as_deref(), Some(site.as_path()));
}

/// Loading stops when a field is never given or a required section is absent.
#[test]
fn incomplete_layers_fail_to_load() {
    let dir = TempDir::new().expect("tempdir");
    let err = ConfigManager::load(fragments(dir.path()), []).unwrap_err();

    let ConfigError::Validation(report) = &err else {
        panic!("expected an incomplete config, got {err:?}");
    };
    let kinds: Vec<_> = report
        .violations
        .iter()
        .map(|violation| (violation.section.join("/"), violation.kind.clone()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("frequency".to_string(), ViolationKind::MissingKey),
            ("output".to_string(), ViolationKind::MissingSection),
        ]
    );
}

/// The user config given at load time may supply the required values.
#[test]
fn user_config_completes_load() {
    let dir = TempDir::new().expect("tempdir");
    let schema = strata_config::Schema::from_fragments(fragments(dir.path())).expect("schema");
    let user = write(
        dir.path(),
        "user.json5",
        "{ frequency: { type: 'custom', frequencies: [30, 44] }, output: { directory: 'maps' } }",
    );
    let manager = ConfigManager::open(schema, [], Some(&user)).expect("manager");
    assert_eq!(manager.frequencies().expect("frequencies"), vec![30.0, 44.0]);
    assert_eq!(manager.layers().len(), 2);
}

/// Unreadable fragments and config files are reported with their paths.
#[test]
fn missing_files_are_read_errors() {
    let dir = TempDir::new().expect("tempdir");
    let err = SchemaFragment::from_path(dir.path().join("nope.json5")).unwrap_err();
    assert!(matches!(err, SchemaError::Read { .. }));

    let complete = ConfigSource::Text(
        "{ frequency: { frequencies: [44] }, output: { directory: '.' } }".to_string(),
    );
    let mut manager = ConfigManager::load(fragments(dir.path()), [complete]).expect("manager");
    let err = manager
        .read_config(dir.path().join("absent.json5"))
        .unwrap_err();
    assert!(err.to_string().starts_with("cannot read config from"));
}

/// Disagreeing fragments stop the manager from being built.
#[test]
fn conflicting_fragments_fail_to_load() {
    let dir = TempDir::new().expect("tempdir");
    let mut all = fragments(dir.path());
    all.push(SchemaFragment::new(
        "30-override.json5",
        r#"{ output: { overwrite: { type: "boolean", default: true } } }"#,
    ));
    let err = ConfigManager::load(all, []).unwrap_err();
    assert!(matches!(err, ConfigError::Schema(SchemaError::Conflict { .. })));
}
