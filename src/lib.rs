//! matchlog-cache
//!
//! Cache-backed persistence for the match log processing service: log sets,
//! player mappings, rendered match pages and cached processing failures.

use shadow_rs::shadow;
shadow!(build);

pub mod cache;
pub mod cli;
pub mod config;
pub mod logger;
pub mod models;

pub use cache::{CacheError, LogCache};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
