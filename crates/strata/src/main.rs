//! Command-line front end for inspecting layered configuration.

mod logger;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::{Value, json};
use std::path::PathBuf;
use strata_config::{
    ConfigError, ConfigManager, ConfigSource, DEFAULT_SEPARATOR, KeyPath, Schema, SchemaFragment,
};

/// Command-line options shared by every subcommand.
#[derive(Parser)]
#[command(name = "strata", version, about = "Inspect layered, schema-validated configuration")]
struct Cli {
    /// Schema fragment file; repeat to merge several
    #[arg(long = "schema", value_name = "FILE", required = true)]
    schemas: Vec<PathBuf>,
    /// Additional config layer, applied in the order given
    #[arg(long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,
    /// User config; relative paths in the config resolve against its directory
    #[arg(long, value_name = "FILE")]
    user_config: Option<PathBuf>,
    /// Separator for nested keys
    #[arg(long, default_value_t = DEFAULT_SEPARATOR)]
    sep: char,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fail unless every field has a value and required sections were given
    Check,
    /// Print the value or section at a nested key
    Get { keys: String },
    /// Print the path stored at a nested key, resolved against the user config
    Path { keys: String },
    /// Print the configured frequency sequence
    Frequencies,
    /// Print the logging setup described by the config
    Logging,
    /// Print the whole merged config
    Dump,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logging = logger::bootstrap();
    let manager = load(&cli)?;
    logging.configure(&manager);
    info!(
        "configuration ready (layers={}, user_config_set={})",
        manager.layers().len(),
        manager.user_config().is_some()
    );

    let output = run(&cli, &manager)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Build the manager from the schema, config and user config files.
fn load(cli: &Cli) -> anyhow::Result<ConfigManager> {
    let fragments = cli
        .schemas
        .iter()
        .map(SchemaFragment::from_path)
        .collect::<Result<Vec<_>, _>>()?;
    let schema = Schema::from_fragments(fragments)?;
    let sources = cli.configs.iter().cloned().map(ConfigSource::from);
    ConfigManager::open(schema, sources, cli.user_config.as_deref())
        .context("failed to load configuration")
}

fn run(cli: &Cli, manager: &ConfigManager) -> anyhow::Result<Value> {
    let value = match &cli.command {
        Command::Check => match manager.check_complete() {
            Ok(()) => json!({ "complete": true }),
            Err(ConfigError::Validation(report)) => {
                let violations: Vec<String> =
                    report.violations.iter().map(ToString::to_string).collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(
                        &json!({ "complete": false, "violations": violations })
                    )?
                );
                bail!(
                    "configuration is incomplete ({} violations)",
                    report.violations.len()
                );
            }
            Err(err) => return Err(err.into()),
        },
        Command::Get { keys } => {
            let node = manager.get_nested(KeyPath::split(keys, cli.sep))?;
            serde_json::to_value(node)?
        }
        Command::Path { keys } => {
            let path = manager.resolve_path(KeyPath::split(keys, cli.sep))?;
            json!(path.display().to_string())
        }
        Command::Frequencies => json!(manager.frequencies()?),
        Command::Logging => serde_json::to_value(manager.logging_description()?)?,
        Command::Dump => manager.to_json()?,
    };
    Ok(value)
}
