//! Command executor for dispatching CLI commands
//!
//! Each command maps to one [`LogCache`] operation and produces a JSON value
//! for the caller to print. Cache errors, including cached processing
//! failures, are returned unchanged.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::parser::{Commands, ErrorAction, LogsAction, MatchAction, PlayerAction};
use crate::cache::{ERROR_MATCH_EXPIRE, LogCache};
use crate::models::{LogSet, MatchPage};

/// Execute a CLI command against the cache
pub async fn execute_command(cache: &LogCache, command: &Commands) -> anyhow::Result<Value> {
    match command {
        Commands::Ping => {
            cache.ping().await?;
            Ok(json!({ "status": "ok" }))
        }
        Commands::Keys { bucket } => {
            let mut keys: Vec<String> = cache.get_all_keys(bucket).await?.into_iter().collect();
            keys.sort();
            Ok(json!({ "bucket": bucket, "keys": keys }))
        }
        Commands::Logs { action } => execute_logs(cache, action).await,
        Commands::Error { action } => execute_error(cache, action).await,
        Commands::Player { action } => execute_player(cache, action).await,
        Commands::Match { action } => execute_match(cache, action).await,
    }
}

async fn execute_logs(cache: &LogCache, action: &LogsAction) -> anyhow::Result<Value> {
    match action {
        LogsAction::Get { match_id } => Ok(serde_json::to_value(cache.get_logs(*match_id).await?)?),
        LogsAction::Set { match_id, file } => {
            let log_set: LogSet = read_json(file).await?;
            cache.set_logs(*match_id, &log_set).await?;
            Ok(json!({ "match_id": match_id, "logs": log_set.logs.len() }))
        }
        LogsAction::Delete { match_id } => {
            let deleted = cache.delete_logs(*match_id).await?;
            tracing::info!(match_id, "Log set deleted");
            Ok(serde_json::to_value(deleted)?)
        }
    }
}

async fn execute_error(cache: &LogCache, action: &ErrorAction) -> anyhow::Result<Value> {
    match action {
        ErrorAction::Check { match_id } => {
            cache.check_log_error(*match_id).await?;
            Ok(json!({ "match_id": match_id, "cached_error": null }))
        }
        ErrorAction::Set { match_id, message } => {
            cache.set_log_error(*match_id, message).await?;
            Ok(json!({
                "match_id": match_id,
                "cached_error": message,
                "expires_in_secs": ERROR_MATCH_EXPIRE.as_secs(),
            }))
        }
    }
}

async fn execute_player(cache: &LogCache, action: &PlayerAction) -> anyhow::Result<Value> {
    match action {
        PlayerAction::Get { player_id } => {
            let steam_id = cache.get_player(player_id).await?;
            Ok(json!({ "player_id": player_id, "steam_id": steam_id }))
        }
        PlayerAction::Set {
            player_id,
            steam_id,
        } => {
            cache.set_player(player_id, steam_id).await?;
            Ok(json!({ "player_id": player_id, "steam_id": steam_id }))
        }
    }
}

async fn execute_match(cache: &LogCache, action: &MatchAction) -> anyhow::Result<Value> {
    match action {
        MatchAction::Get { log_id } => Ok(serde_json::to_value(cache.get_match(*log_id).await?)?),
        MatchAction::Set { file, log_ids } => {
            let page: MatchPage = read_json(file).await?;
            cache.set_match(log_ids, &page).await?;
            Ok(json!({ "match_id": page.match_id, "log_ids": log_ids }))
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}
