//! Hash buckets used by the log cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;

/// One of the three hash buckets the log cache writes to.
///
/// The string forms are the literal hash names in the store and must not
/// change, existing data is addressed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Log sets keyed by match id.
    Matches,
    /// Steam ids keyed by player id.
    Players,
    /// Match pages keyed by log id.
    Logs,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Matches, Bucket::Players, Bucket::Logs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Matches => "matches",
            Bucket::Players => "players",
            Bucket::Logs => "logs",
        }
    }
}

impl FromStr for Bucket {
    type Err = CacheError;

    /// Exact, case-sensitive match against the stored hash names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matches" => Ok(Bucket::Matches),
            "players" => Ok(Bucket::Players),
            "logs" => Ok(Bucket::Logs),
            _ => Err(CacheError::InvalidBucket(s.to_string())),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
