//! Schema-validated, layered configuration.
//!
//! This crate owns the schema model, the validation and merge engine, nested
//! key lookup, path resolution against the user config location, and the
//! values derived from the merged tree (frequency sequence, logging setup).

mod access;
mod derived;
mod error;
mod manager;
mod merge;
mod schema;
mod validate;
mod value;

/// Nested key paths used by lookup APIs.
pub use access::{DEFAULT_SEPARATOR, KeyPath};
/// Derived values computed from the merged config.
pub use derived::{
    FileMode, LogLevel, LogTarget, LoggingDescription, MAX_FREQUENCIES, StdStream,
    frequency_sequence,
};
/// Public error types returned by schema loading, validation and lookup.
pub use error::{ConfigError, SchemaError, ValidationError, Violation, ViolationKind};
/// Config manager and its layer/source types.
pub use manager::{ConfigLayer, ConfigLayerSource, ConfigManager, ConfigSource, resolve_against};
/// Layer merging.
pub use merge::merge;
/// Schema model and loader.
pub use schema::{Constraints, FieldKind, FieldSpec, Schema, SchemaEntry, SchemaFragment, SchemaSection};
/// Validation entry points.
pub use validate::{SchemaMode, check_complete, validate, validate_layer, validate_with_mode};
/// Typed configuration tree.
pub use value::{ConfigNode, ConfigTree, ConfigValue, Entry, Field, Section};
