//! CLI module for matchlog-cache
//!
//! - Argument parsing with clap
//! - Configuration loading with CLI overrides
//! - Command execution against the log cache

pub mod executor;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{Cli, Commands};

use crate::config::{ConfigError, ConfigLoader, Settings};
use crate::logger::init_logger;

/// Load configuration and apply CLI overrides
///
/// `--config` switches the loader to single-file mode, `--env` picks the
/// environment layer, and `-v` / `-q` override the log level.
pub fn load_settings(cli: &Cli) -> Result<Settings, ConfigError> {
    let mut loader = ConfigLoader::new()?;
    if let Some(ref path) = cli.config {
        loader = loader.with_file(path);
    }
    if let Some(environment) = cli.env {
        loader = loader.with_environment(environment);
    }

    resolve_settings(loader.load_unvalidated()?, cli)
}

/// Apply CLI overrides, then validate once
fn resolve_settings(mut settings: Settings, cli: &Cli) -> Result<Settings, ConfigError> {
    apply_cli_overrides(&mut settings, cli);
    settings.validate()?;
    Ok(settings)
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if cli.verbose {
        settings.logger.level = "debug".to_string();
    } else if cli.quiet {
        settings.logger.level = "error".to_string();
    }
}

/// Initialize logger from settings
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(logger_config)
}
