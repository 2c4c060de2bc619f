mod log_set;
mod match_page;

pub use log_set::{LogSet, RawLog};
pub use match_page::{MatchPage, PlayerSummary, TeamSummary};
