//! Path helpers for values that name files.

use crate::ConfigError;
use directories::UserDirs;
use log::warn;
use std::path::{Path, PathBuf};

/// Leading marker expanded to the home directory.
const HOME_MARKER: &str = "~";

/// Resolve a configured path against the user config location.
///
/// Absolute paths (after `~` expansion) are returned unchanged. Relative paths
/// are joined to the directory containing `user_config`; with no user config
/// they are returned unresolved and a warning is logged.
pub fn resolve_against(value: &str, user_config: Option<&Path>) -> PathBuf {
    let expanded = expand_home(value);
    if expanded.is_absolute() {
        return expanded;
    }
    match user_config.and_then(Path::parent) {
        Some(base) => base.join(expanded),
        None => {
            warn!("cannot convert to absolute path: {}", expanded.display());
            expanded
        }
    }
}

/// Expand `~` and `~/...`; `~user` forms are left alone.
fn expand_home(value: &str) -> PathBuf {
    let rest = if value == HOME_MARKER {
        Some("")
    } else {
        value
            .strip_prefix(HOME_MARKER)
            .and_then(|rest| rest.strip_prefix(['/', '\\']))
    };
    match (rest, home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

fn home_dir() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Absolute form of `path`, canonicalized when it exists.
pub(super) fn absolute_path(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::path::absolute(path).map_err(|source| ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
