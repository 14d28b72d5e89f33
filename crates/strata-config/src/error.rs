//! Error types for schema loading, validation and config access.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while assembling a schema from fragments.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Reading a schema fragment from disk failed.
    #[error("failed to read schema fragment {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A fragment is not valid JSON5.
    #[error("failed to parse schema fragment {fragment}: {source}")]
    Parse {
        fragment: String,
        source: json5::Error,
    },
    /// A declaration inside a fragment is malformed.
    #[error("invalid schema declaration in {fragment} at {path}: {message}")]
    InvalidDeclaration {
        fragment: String,
        path: String,
        message: String,
    },
    /// Two fragments declare the same path differently.
    #[error("conflicting schema declarations at {path}: {message}")]
    Conflict { path: String, message: String },
}

/// What went wrong for a single schema-declared location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A field without a default has no value.
    MissingKey,
    /// A required section was never provided.
    MissingSection,
    /// A value was present but failed coercion or a constraint check.
    Failed(String),
}

/// One validation failure, located by section path and optional field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub section: Vec<String>,
    pub field: Option<String>,
    pub kind: ViolationKind,
}

impl Violation {
    pub(crate) fn missing_key(section: &[String], field: &str) -> Self {
        Self {
            section: section.to_vec(),
            field: Some(field.to_string()),
            kind: ViolationKind::MissingKey,
        }
    }

    pub(crate) fn missing_section(section: &[String]) -> Self {
        Self {
            section: section.to_vec(),
            field: None,
            kind: ViolationKind::MissingSection,
        }
    }

    pub(crate) fn failed(section: &[String], field: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            section: section.to_vec(),
            field: field.map(str::to_string),
            kind: ViolationKind::Failed(reason.into()),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = if self.section.is_empty() {
            "root".to_string()
        } else {
            self.section.join("/")
        };
        match (&self.field, &self.kind) {
            (Some(key), ViolationKind::MissingKey) => {
                write!(f, "key \"{key}\" in section \"{section}\" is missing")
            }
            (Some(key), ViolationKind::Failed(reason)) => {
                write!(
                    f,
                    "key \"{key}\" in section \"{section}\" failed validation: {reason}"
                )
            }
            (None, ViolationKind::Failed(reason)) => {
                write!(f, "section \"{section}\" failed validation: {reason}")
            }
            (_, ViolationKind::MissingSection) | (None, ViolationKind::MissingKey) => {
                write!(f, "section \"{section}\" is missing")
            }
        }
    }
}

/// Every violation found while validating one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.violations.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Errors returned by the config manager and its accessors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Building the schema failed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// Reading a config source failed.
    #[error("cannot read config from \"{}\": {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Parsing a config source failed.
    #[error("failed to parse config {source_label}: {source}")]
    ParseFailed {
        source_label: String,
        source: json5::Error,
    },
    /// One or more values violate the schema.
    #[error("config failed validation:\n{0}")]
    Validation(#[from] ValidationError),
    /// A user config has already been recorded for this manager.
    #[error("user configuration already loaded from \"{}\"", .0.display())]
    UserConfigAlreadyLoaded(PathBuf),
    /// A nested lookup did not reach a value.
    #[error("key not found: {0}")]
    KeyNotFound(String),
    /// Serializing the merged tree failed.
    #[error("failed to encode config: {0}")]
    Encode(#[from] serde_json::Error),
    /// A value is well-typed but cannot be used for a derived computation.
    #[error("invalid configuration value: {0}")]
    InvalidConfig(String),
}
