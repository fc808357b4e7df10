//! Error types for ga4cache

use std::time::Duration;
use thiserror::Error;

use crate::query::QueryResult;

/// Result type alias for ga4cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The gateway rejected a fully assembled report request.
    ///
    /// `attempt` is the error-annotated result envelope, kept so callers can
    /// record the failed attempt.
    #[error("{source}")]
    Report {
        #[source]
        source: ApiError,
        attempt: Box<QueryResult>,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl Error {
    /// The remote failure behind this error, if it came from the gateway.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) | Error::Report { source: err, .. } => Some(err),
            _ => None,
        }
    }

    /// The error-annotated attempt record for failed report runs.
    pub fn failed_attempt(&self) -> Option<&QueryResult> {
        match self {
            Error::Report { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    /// Whether the remote service reported the subject as not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self.api_error(), Some(ApiError::NotFound(_)))
    }
}

/// Malformed or out-of-range query specifications
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Property ID is required")]
    MissingSubject,

    #[error("Date range is required (start_date and end_date)")]
    MissingDateRange,

    #[error("Invalid {which} date: {value}")]
    InvalidDate { which: &'static str, value: String },

    #[error("Start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("At least one dimension or metric is required")]
    EmptySelection,

    #[error("Limit cannot exceed {max} rows (got {limit})")]
    LimitTooLarge { limit: i64, max: i64 },

    #[error("Offset cannot be negative (got {0})")]
    NegativeOffset(i64),

    #[error("Filter {index} is invalid: {reason}")]
    Filter { index: usize, reason: String },

    #[error("Order by {index} is invalid: {reason}")]
    OrderBy { index: usize, reason: String },

    #[error("Dimension '{0}' not found in property")]
    UnknownDimension(String),

    #[error("Metric '{0}' not found in property")]
    UnknownMetric(String),

    #[error("Field metadata is required in strict mode but could not be loaded: {0}")]
    MetadataUnavailable(String),
}

/// Failures turning filter specifications into a filter expression tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslationError {
    #[error("Unsupported filter type: {0}")]
    UnsupportedKind(String),

    #[error("Filter on '{field}' has no {kind} payload")]
    MissingPayload { field: String, kind: String },

    #[error("Unknown string match type: {0}")]
    UnknownMatchType(String),

    #[error("Unknown numeric operation: {0}")]
    UnknownOperation(String),
}

/// Remote reporting gateway errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("Access token rejected. Update `access_token` in the ga4cache config.")]
    Unauthorized,

    #[error("Access denied. You don't have permission to access this property.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Data API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Report request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Cache store errors
///
/// The query path degrades every one of these to a cache miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Could not determine cache directory")]
    NoHome,

    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(String),

    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Cache lock poisoned")]
    Poisoned,

    #[error("Cache store is closed")]
    Closed,

    #[error("Invalid cache context name: '{0}'")]
    InvalidContext(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Access token not configured. Set `access_token` in the ga4cache config.")]
    MissingAccessToken,

    #[error("Property not specified. Pass --property or set `default_property` in the config.")]
    MissingProperty,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_limit_message() {
        let err = ValidationError::LimitTooLarge {
            limit: 300_000,
            max: 250_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("250000"));
        assert!(msg.contains("300000"));
    }

    #[test]
    fn test_validation_filter_message() {
        let err = ValidationError::Filter {
            index: 2,
            reason: "in-list values are required".to_string(),
        };
        assert!(err.to_string().contains("Filter 2"));
    }

    #[test]
    fn test_translation_unsupported_kind() {
        let err = TranslationError::UnsupportedKind("regex_list".to_string());
        assert!(err.to_string().contains("regex_list"));
    }

    #[test]
    fn test_api_error_status() {
        let err = ApiError::Status {
            status: 503,
            message: "backend unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("backend unavailable"));
    }

    #[test]
    fn test_api_error_rate_limit() {
        let err = ApiError::RateLimit(Duration::from_secs(30));
        let msg = err.to_string();
        assert!(msg.contains("Rate limit"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_error_from_api_error_is_not_found() {
        let err: Error = ApiError::NotFound("properties/1".to_string()).into();
        assert!(err.is_not_found());
        assert!(err.failed_attempt().is_none());
    }

    #[test]
    fn test_error_from_validation_error() {
        let err: Error = ValidationError::MissingSubject.into();
        match err {
            Error::Validation(ValidationError::MissingSubject) => (),
            _ => panic!("Expected Error::Validation(MissingSubject)"),
        }
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
