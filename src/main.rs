use clap::Parser;

use matchlog_cache::LogCache;
use matchlog_cache::cli::{Cli, execute_command, init_logger_from_settings, load_settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    init_logger_from_settings(&settings)?;

    tracing::debug!(
        app = %settings.application.name,
        version = %settings.application.version,
        "Starting"
    );

    let cache = LogCache::from_config(&settings.cache).await?;
    let output = execute_command(&cache, &cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
