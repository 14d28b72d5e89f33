//! Config manager: one schema, a default layer, and successive merged layers.
//!
//! Every source is validated before it touches the merged tree, and the merged
//! result must be complete, so a failed `read_config` or `read_userconfig`
//! leaves the manager unchanged.

mod paths;


pub use paths::resolve_against;

use crate::access::lookup;
use crate::{
    ConfigError, ConfigNode, ConfigTree, KeyPath, Schema, SchemaFragment, check_complete, merge,
    validate_layer,
};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Where a layer's contents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A JSON5 file on disk.
    Path(PathBuf),
    /// In-memory JSON5, one entry per line.
    Lines(Vec<String>),
    /// In-memory JSON5 text.
    Text(String),
}

impl ConfigSource {
    /// Label used in logs and parse errors.
    pub fn label(&self) -> String {
        match self {
            ConfigSource::Path(path) => path.display().to_string(),
            ConfigSource::Lines(lines) => format!("<{} lines>", lines.len()),
            ConfigSource::Text(text) => format!("<text, len={}>", text.len()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Path(path) => Some(path),
            ConfigSource::Lines(_) | ConfigSource::Text(_) => None,
        }
    }

    /// Read and parse the source into a raw tree. Blank input is an empty mapping.
    fn read(&self) -> Result<Value, ConfigError> {
        let text = match self {
            ConfigSource::Path(path) => {
                fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
                    path: path.clone(),
                    source,
                })?
            }
            ConfigSource::Lines(lines) => lines.join("\n"),
            ConfigSource::Text(text) => text.clone(),
        };
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        json5::from_str(&text).map_err(|source| ConfigError::ParseFailed {
            source_label: self.label(),
            source,
        })
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        ConfigSource::Path(path.to_path_buf())
    }
}

impl From<Vec<String>> for ConfigSource {
    fn from(lines: Vec<String>) -> Self {
        ConfigSource::Lines(lines)
    }
}

/// Role of a layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// Schema defaults.
    Default,
    /// A layer added through `read_config`.
    Additional,
    /// The single user config.
    User,
}

/// Metadata about a merged layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Layer role.
    pub source: ConfigLayerSource,
    /// Location on disk, for file sources.
    pub path: Option<PathBuf>,
}

/// Owns the schema and the merged config built from successive layers.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    schema: Schema,
    config: ConfigTree,
    user_config: Option<PathBuf>,
    layers: Vec<ConfigLayer>,
}

impl ConfigManager {
    /// Establish schema defaults, then merge `sources` in order.
    ///
    /// Fails unless the merged result is complete: every field has a value and
    /// every required section was given by some source.
    pub fn new(
        schema: Schema,
        sources: impl IntoIterator<Item = ConfigSource>,
    ) -> Result<Self, ConfigError> {
        Self::open(schema, sources, None::<&Path>)
    }

    /// Like [`ConfigManager::new`], also merging a user config before the
    /// completeness check so it can supply required values.
    pub fn open(
        schema: Schema,
        sources: impl IntoIterator<Item = ConfigSource>,
        user_config: Option<impl AsRef<Path>>,
    ) -> Result<Self, ConfigError> {
        let defaults = validate_layer(&Value::Object(Map::new()), &schema)?;
        info!(
            "loaded default config (fields={})",
            schema.root().field_count()
        );
        let mut manager = Self {
            schema,
            config: defaults,
            user_config: None,
            layers: vec![ConfigLayer {
                source: ConfigLayerSource::Default,
                path: None,
            }],
        };
        for source in sources {
            manager.merge_source(&source, ConfigLayerSource::Additional, false)?;
        }
        if let Some(path) = user_config {
            manager.merge_user(path.as_ref(), false)?;
        }
        manager.check_complete()?;
        Ok(manager)
    }

    /// Build the schema from fragments, then behave like [`ConfigManager::new`].
    pub fn load(
        fragments: impl IntoIterator<Item = SchemaFragment>,
        sources: impl IntoIterator<Item = ConfigSource>,
    ) -> Result<Self, ConfigError> {
        let schema = Schema::from_fragments(fragments)?;
        Self::new(schema, sources)
    }

    /// Validate and merge one more layer.
    pub fn read_config(&mut self, source: impl Into<ConfigSource>) -> Result<(), ConfigError> {
        self.merge_source(&source.into(), ConfigLayerSource::Additional, true)
    }

    /// Merge the user config and remember its location for path resolution.
    ///
    /// Only one user config is allowed per manager.
    pub fn read_userconfig(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.merge_user(path.as_ref(), true)
    }

    fn merge_user(&mut self, path: &Path, require_complete: bool) -> Result<(), ConfigError> {
        if let Some(existing) = &self.user_config {
            return Err(ConfigError::UserConfigAlreadyLoaded(existing.clone()));
        }
        let absolute = paths::absolute_path(path)?;
        self.merge_source(
            &ConfigSource::Path(path.to_path_buf()),
            ConfigLayerSource::User,
            require_complete,
        )?;
        info!("loaded user config: {}", absolute.display());
        self.user_config = Some(absolute);
        Ok(())
    }

    /// Merge into a candidate tree and commit only if it validates.
    fn merge_source(
        &mut self,
        source: &ConfigSource,
        role: ConfigLayerSource,
        require_complete: bool,
    ) -> Result<(), ConfigError> {
        debug!("reading config layer (source={role:?}, from={})", source.label());
        let raw = source.read()?;
        let layer = validate_layer(&raw, &self.schema)?;
        let mut merged = self.config.clone();
        merge(&mut merged, &layer);
        if require_complete {
            check_complete(&merged, &self.schema)?;
        }
        self.config = merged;
        self.layers.push(ConfigLayer {
            source: role,
            path: source.path().map(Path::to_path_buf),
        });
        info!("loaded config layer (source={role:?}, from={})", source.label());
        Ok(())
    }

    /// Fail if any field is still unset or a required section was never given.
    pub fn check_complete(&self) -> Result<(), ConfigError> {
        check_complete(&self.config, &self.schema)?;
        Ok(())
    }

    /// Single-level lookup.
    pub fn get(&self, key: &str) -> Option<ConfigNode<'_>> {
        self.config.get(key)
    }

    pub fn get_or<'a>(&'a self, key: &str, fallback: ConfigNode<'a>) -> ConfigNode<'a> {
        self.config.get_or(key, fallback)
    }

    /// Nested lookup by `/`-separated string or by explicit segments.
    pub fn get_nested(&self, keys: impl Into<KeyPath>) -> Result<ConfigNode<'_>, ConfigError> {
        lookup(self.config.root(), &keys.into())
    }

    pub fn get_nested_sep(&self, keys: &str, sep: char) -> Result<ConfigNode<'_>, ConfigError> {
        self.config.get_nested_sep(keys, sep)
    }

    pub fn get_nested_or<'a>(
        &'a self,
        keys: impl Into<KeyPath>,
        sentinel: ConfigNode<'a>,
    ) -> ConfigNode<'a> {
        self.config.get_nested_or(keys, sentinel)
    }

    /// Resolve the path stored at `keys`.
    ///
    /// `~` expands to the home directory. Relative paths are anchored at the
    /// user config's directory when one was loaded; otherwise they are
    /// returned as-is with a warning.
    pub fn resolve_path(&self, keys: impl Into<KeyPath>) -> Result<PathBuf, ConfigError> {
        let keys = keys.into();
        let node = lookup(self.config.root(), &keys)?;
        let value = node.as_str().ok_or_else(|| {
            ConfigError::InvalidConfig(format!("{keys} does not hold a path string"))
        })?;
        Ok(resolve_against(value, self.user_config.as_deref()))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The merged config tree.
    pub fn config(&self) -> &ConfigTree {
        &self.config
    }

    /// Absolute path of the loaded user config, if any.
    pub fn user_config(&self) -> Option<&Path> {
        self.user_config.as_deref()
    }

    /// Layers merged so far, oldest first.
    pub fn layers(&self) -> &[ConfigLayer] {
        &self.layers
    }

    /// The merged tree as JSON; unset fields are `null`.
    pub fn to_json(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(&self.config)?)
    }
}
