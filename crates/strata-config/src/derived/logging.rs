//! Logging setup described by the `logging` section.
//!
//! Only a description is produced; opening files or streams is up to the
//! caller's logging backend.

use super::{optional_str, required_str};
use crate::{ConfigError, ConfigManager};
use log::LevelFilter;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Severity levels accepted in `logging/level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Case-insensitive parse of a level name.
    pub fn parse(name: &str) -> Option<Self> {
        let level = match name.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARNING" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            "CRITICAL" => LogLevel::Critical,
            _ => return None,
        };
        Some(level)
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Closest `log` filter; `log` has no level above error.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Standard process streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StdStream {
    Stdout,
    Stderr,
}

impl StdStream {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "stdout" => Some(StdStream::Stdout),
            "stderr" => Some(StdStream::Stderr),
            _ => None,
        }
    }
}

/// How an existing log file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileMode {
    Append,
    Truncate,
}

impl FileMode {
    /// Parse `a`/`w` style mode strings.
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "a" | "append" => Some(FileMode::Append),
            "w" | "write" | "truncate" => Some(FileMode::Truncate),
            _ => None,
        }
    }
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    Stream(StdStream),
    File { path: PathBuf, mode: FileMode },
}

/// Everything a logging backend needs to set itself up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingDescription {
    pub level: LogLevel,
    /// Record template, e.g. `%(asctime)s [%(levelname)s] %(name)s: %(message)s`.
    pub format: String,
    /// strftime-style timestamp format.
    pub date_format: String,
    pub targets: Vec<LogTarget>,
}

impl ConfigManager {
    /// Assemble the logging description from the `logging` section.
    ///
    /// `stream` and `filename` are optional; empty strings disable them.
    /// The log file path is resolved like any other configured path.
    pub fn logging_description(&self) -> Result<LoggingDescription, ConfigError> {
        let level_name = required_str(self, "logging/level")?;
        let level = LogLevel::parse(level_name).ok_or_else(|| {
            ConfigError::InvalidConfig(format!("unknown logging level \"{level_name}\""))
        })?;
        let format = required_str(self, "logging/format")?.to_string();
        let date_format = required_str(self, "logging/datefmt")?.to_string();

        let mut targets = Vec::new();
        if let Some(stream) = optional_str(self, "logging/stream")?.filter(|s| !s.is_empty()) {
            let stream = StdStream::parse(stream).ok_or_else(|| {
                ConfigError::InvalidConfig(format!("unknown logging stream \"{stream}\""))
            })?;
            targets.push(LogTarget::Stream(stream));
        }
        if optional_str(self, "logging/filename")?.is_some_and(|name| !name.is_empty()) {
            let mode = match optional_str(self, "logging/filemode")? {
                None => FileMode::Append,
                Some(mode) => FileMode::parse(mode).ok_or_else(|| {
                    ConfigError::InvalidConfig(format!("unknown logging file mode \"{mode}\""))
                })?,
            };
            let path = self.resolve_path("logging/filename")?;
            targets.push(LogTarget::File { path, mode });
        }

        Ok(LoggingDescription {
            level,
            format,
            date_format,
            targets,
        })
    }
}
