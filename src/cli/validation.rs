//! CLI argument validation functions
//!
//! Checks that go beyond what clap can validate automatically.

use std::fs;
use std::path::PathBuf;

fn validate_readable_file(kind: &str, path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("{} file does not exist: '{}'", kind, path_str));
    }

    if !path.is_file() {
        return Err(format!("{} path is not a file: '{}'", kind, path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read {} file '{}': {}", kind.to_lowercase(), path_str, e)),
    }
}

/// Validate that a configuration file exists and is readable
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    validate_readable_file("Configuration", path_str)
}

/// Validate that a JSON input file exists and is readable
pub fn validate_input_file_path(path_str: &str) -> Result<PathBuf, String> {
    validate_readable_file("Input", path_str)
}
