//! Process logger built from the configured `logging` section.
//!
//! A default env logger is installed before the configuration is read so
//! loading is logged too; it is swapped for the configured one afterwards.

use anyhow::{Context, bail};
use chrono::format::{Item, StrftimeItems};
use env_logger::{Target, WriteStyle};
use log::{Level, Log, Metadata, Record, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::{Arc, RwLock};
use strata_config::{ConfigManager, FileMode, LogTarget, LoggingDescription, StdStream};

/// Forwards every record to whichever env logger is current.
struct SwappableLogger {
    inner: Arc<RwLock<env_logger::Logger>>,
}

impl Log for SwappableLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner
            .read()
            .map(|logger| logger.enabled(metadata))
            .unwrap_or(false)
    }

    fn log(&self, record: &Record) {
        if let Ok(logger) = self.inner.read() {
            logger.log(record);
        }
    }

    fn flush(&self) {
        if let Ok(logger) = self.inner.read() {
            logger.flush();
        }
    }
}

/// Replaces the installed logger once the configuration is known.
pub struct LoggerHandle {
    inner: Arc<RwLock<env_logger::Logger>>,
}

fn swappable(logger: env_logger::Logger) -> (SwappableLogger, LoggerHandle) {
    let inner = Arc::new(RwLock::new(logger));
    (
        SwappableLogger {
            inner: Arc::clone(&inner),
        },
        LoggerHandle { inner },
    )
}

/// Install the plain env logger, honouring `RUST_LOG`.
pub fn bootstrap() -> LoggerHandle {
    let logger = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .build();
    let max_level = logger.filter();
    let (logger, handle) = swappable(logger);
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }
    handle
}

impl LoggerHandle {
    /// Switch to the logger described by `manager`, keeping the default one
    /// when the description cannot be built.
    pub fn configure(&self, manager: &ConfigManager) {
        let configured = manager
            .logging_description()
            .map_err(anyhow::Error::from)
            .and_then(|description| builder(&description));
        match configured {
            Ok(mut builder) => self.replace(builder.build()),
            Err(err) => warn!("using default logging: {err:#}"),
        }
    }

    fn replace(&self, logger: env_logger::Logger) {
        let max_level = logger.filter();
        match self.inner.write() {
            Ok(mut current) => *current = logger,
            Err(poisoned) => *poisoned.into_inner() = logger,
        }
        log::set_max_level(max_level);
    }
}

/// Logger builder for a description. `RUST_LOG` still overrides the level.
pub fn builder(description: &LoggingDescription) -> anyhow::Result<env_logger::Builder> {
    if StrftimeItems::new(&description.date_format).any(|item| matches!(item, Item::Error)) {
        bail!("invalid logging datefmt \"{}\"", description.date_format);
    }
    let template = LogTemplate::parse(&description.format);
    let date_format = description.date_format.clone();
    let sinks = description
        .targets
        .iter()
        .map(open_sink)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(description.level.to_level_filter())
        .parse_default_env()
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(Tee { sinks })))
        .format(move |buf, record| {
            let asctime = if template.needs_time() {
                chrono::Local::now().format(&date_format).to_string()
            } else {
                String::new()
            };
            let message = record.args().to_string();
            let line = template.render(&LogFields {
                asctime: &asctime,
                levelname: level_name(record.level()),
                name: record.target(),
                message: &message,
            });
            writeln!(buf, "{line}")
        });
    Ok(builder)
}

fn open_sink(target: &LogTarget) -> anyhow::Result<Box<dyn Write + Send>> {
    let sink: Box<dyn Write + Send> = match target {
        LogTarget::Stream(StdStream::Stdout) => Box::new(io::stdout()),
        LogTarget::Stream(StdStream::Stderr) => Box::new(io::stderr()),
        LogTarget::File { path, mode } => Box::new(open_log_file(path, *mode).with_context(
            || format!("failed to open log file {}", path.display()),
        )?),
    };
    Ok(sink)
}

fn open_log_file(path: &std::path::Path, mode: FileMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        FileMode::Append => options.append(true),
        FileMode::Truncate => options.write(true).truncate(true),
    };
    options.open(path)
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Writes every record to each sink in turn.
struct Tee {
    sinks: Vec<Box<dyn Write + Send>>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

/// Values substituted into a record template.
#[derive(Debug, Clone, Copy)]
pub struct LogFields<'a> {
    pub asctime: &'a str,
    pub levelname: &'a str,
    pub name: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    AscTime,
    LevelName,
    Name,
    Message,
}

/// A `%(field)s` record template, parsed once.
///
/// Unknown placeholders are kept as literal text and `%%` is a single `%`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTemplate {
    pieces: Vec<Piece>,
}

impl LogTemplate {
    pub fn parse(template: &str) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while let Some(idx) = rest.find('%') {
            literal.push_str(&rest[..idx]);
            rest = &rest[idx..];
            if let Some(after) = rest.strip_prefix("%%") {
                literal.push('%');
                rest = after;
                continue;
            }
            let placeholder = rest
                .strip_prefix("%(")
                .and_then(|inner| inner.split_once(")s"))
                .and_then(|(name, after)| field_piece(name).map(|piece| (piece, after)));
            match placeholder {
                Some((piece, after)) => {
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(piece);
                    rest = after;
                }
                None => {
                    literal.push('%');
                    rest = &rest[1..];
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Self { pieces }
    }

    pub fn needs_time(&self) -> bool {
        self.pieces.contains(&Piece::AscTime)
    }

    pub fn render(&self, fields: &LogFields<'_>) -> String {
        let mut line = String::new();
        for piece in &self.pieces {
            line.push_str(match piece {
                Piece::Literal(text) => text,
                Piece::AscTime => fields.asctime,
                Piece::LevelName => fields.levelname,
                Piece::Name => fields.name,
                Piece::Message => fields.message,
            });
        }
        line
    }
}

fn field_piece(name: &str) -> Option<Piece> {
    match name {
        "asctime" => Some(Piece::AscTime),
        "levelname" => Some(Piece::LevelName),
        "name" => Some(Piece::Name),
        "message" => Some(Piece::Message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use strata_config::LogLevel;
    use tempfile::TempDir;

    const FIELDS: LogFields<'static> = LogFields {
        asctime: "2024-05-01 12:00:00",
        levelname: "INFO",
        name: "strata",
        message: "ready",
    };

    /// The usual record layout renders every field.
    #[test]
    fn renders_known_fields() {
        let template = LogTemplate::parse("%(asctime)s [%(levelname)s] %(name)s: %(message)s");
        assert!(template.needs_time());
        assert_eq!(
            template.render(&FIELDS),
            "2024-05-01 12:00:00 [INFO] strata: ready"
        );
    }

    /// Unknown placeholders and stray percent signs survive as text.
    #[test]
    fn keeps_unknown_placeholders() {
        let template = LogTemplate::parse("%(process)d 100%% %(message)s %");
        assert!(!template.needs_time());
        assert_eq!(template.render(&FIELDS), "%(process)d 100% ready %");
    }

    /// Bad date formats are rejected before any sink is opened.
    #[test]
    fn rejects_invalid_date_format() {
        let description = LoggingDescription {
            level: LogLevel::Info,
            format: "%(message)s".to_string(),
            date_format: "%Q".to_string(),
            targets: Vec::new(),
        };
        assert!(builder(&description).is_err());
    }

    /// Records follow the logger swapped in after startup.
    #[test]
    fn swapped_logger_takes_effect() {
        let initial = env_logger::Builder::new()
            .filter_level(log::LevelFilter::Warn)
            .build();
        let (logger, handle) = swappable(initial);
        let info = Metadata::builder().level(Level::Info).target("strata").build();
        assert!(!logger.enabled(&info));

        let description = LoggingDescription {
            level: LogLevel::Debug,
            format: "%(message)s".to_string(),
            date_format: "%H:%M:%S".to_string(),
            targets: Vec::new(),
        };
        handle.replace(builder(&description).expect("builder").build());
        assert!(logger.enabled(&info));
    }

    /// Truncate mode empties an existing log file; append mode keeps it.
    #[test]
    fn file_modes() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("run.log");
        std::fs::write(&path, "old\n").expect("seed");

        let mut file = open_log_file(&path, FileMode::Append).expect("append");
        file.write_all(b"new\n").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "old\nnew\n");

        open_log_file(&path, FileMode::Truncate).expect("truncate");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "");
    }
}
