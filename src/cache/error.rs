//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The requested field is absent from its bucket.
    #[error("Field '{field}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, field: String },

    /// Stored bytes could not be decoded into the expected type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Processing of a match failed recently and is still inside its
    /// suppression window. Carries the recorded error text.
    #[error("cached error, retry later: {0}")]
    CachedFailure(String),

    #[error("Unknown hash key: {0}")]
    InvalidBucket(String),
}

impl CacheError {
    pub fn not_found(bucket: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            field: field.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True when this is a cached processing failure rather than a problem
    /// with the cache itself.
    pub fn is_cached_failure(&self) -> bool {
        matches!(self, Self::CachedFailure(_))
    }

    /// True for errors raised while talking to the store.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Operation(_) | Self::Connection(_))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Decode(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_failure_display_wraps_text() {
        let err = CacheError::CachedFailure("demo file is corrupt".to_string());
        assert_eq!(
            err.to_string(),
            "cached error, retry later: demo file is corrupt"
        );
        assert!(err.is_cached_failure());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_classification() {
        assert!(CacheError::not_found("matches", "1").is_not_found());
        assert!(CacheError::Connection("refused".into()).is_transport());
        assert!(CacheError::Operation("timeout".into()).is_transport());
        assert!(!CacheError::InvalidBucket("bogus".into()).is_transport());
    }

    #[test]
    fn test_json_error_converts_to_decode() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(CacheError::from(err), CacheError::Decode(_)));
    }
}
