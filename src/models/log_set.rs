use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Raw log files collected for a single match.
///
/// Stored as JSON in the `matches` bucket under the match id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSet {
    pub match_id: i64,
    #[serde(default)]
    pub logs: Vec<RawLog>,
    pub uploaded_at: Timestamp,
}

/// One uploaded log file and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    pub log_id: i64,
    /// Where the log came from, e.g. an upload host or file name
    pub source: String,
    #[serde(default)]
    pub lines: Vec<String>,
}

impl LogSet {
    pub fn new(match_id: i64, logs: Vec<RawLog>) -> Self {
        Self {
            match_id,
            logs,
            uploaded_at: Timestamp::now(),
        }
    }

    /// Ids of every log in the set, in upload order.
    pub fn log_ids(&self) -> Vec<i64> {
        self.logs.iter().map(|log| log.log_id).collect()
    }
}
