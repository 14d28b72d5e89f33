//! Values computed from the merged config rather than stored in it.

mod frequency;
mod logging;

pub use frequency::{MAX_FREQUENCIES, frequency_sequence};
pub use logging::{FileMode, LogLevel, LogTarget, LoggingDescription, StdStream};

use crate::{ConfigError, ConfigManager};

/// Fetch a required string value.
fn required_str<'a>(manager: &'a ConfigManager, keys: &str) -> Result<&'a str, ConfigError> {
    manager
        .get_nested(keys)?
        .as_str()
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{keys} must be a string")))
}

/// Fetch an optional string value; absent or unset keys yield `None`.
fn optional_str<'a>(manager: &'a ConfigManager, keys: &str) -> Result<Option<&'a str>, ConfigError> {
    match manager.get_nested(keys) {
        Ok(node) => node
            .as_str()
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidConfig(format!("{keys} must be a string"))),
        Err(ConfigError::KeyNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

fn required_f64(manager: &ConfigManager, keys: &str) -> Result<f64, ConfigError> {
    manager
        .get_nested(keys)?
        .as_f64()
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{keys} must be a number")))
}
