use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Rendered view of a match.
///
/// A match may be uploaded as several logs, so the same page is stored in
/// the `logs` bucket once per log id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPage {
    pub match_id: i64,
    pub log_ids: Vec<i64>,
    pub map: String,
    pub duration_secs: u64,
    #[serde(default)]
    pub teams: Vec<TeamSummary>,
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
    pub rendered_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub steam_id: String,
    pub name: String,
    pub team: String,
    pub kills: u32,
    pub deaths: u32,
    pub damage: u64,
}
