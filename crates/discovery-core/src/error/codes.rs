use serde::{Deserialize, Serialize};
use std::fmt;

/// Standardized error codes for the discovery service.
///
/// Numeric ranges follow the taxonomy by source from the error-handling
/// design: configuration (fatal at startup), database, external-service
/// (search engine / language model / embedding model), model-output
/// malformation, vocabulary misses, and client-input errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General System Errors (1000-1999)
    InternalServerError = 1000,
    ConfigurationError = 1001,
    ServiceUnavailable = 1002,
    Timeout = 1003,
    NotImplemented = 1004,

    // Database Errors (2000-2999)
    DatabaseConnectionError = 2000,
    DatabaseConstraintViolation = 2001,
    DatabaseTransactionError = 2002,
    DatabaseQueryError = 2003,
    DatabaseMigrationError = 2004,

    // External Service Errors (3000-3999) - search engine, language model
    SearchEngineError = 3000,
    SearchEngineTimeout = 3001,
    SearchEngineUnavailable = 3002,
    LlmError = 3003,
    LlmTimeout = 3004,
    LlmUnavailable = 3005,
    SerializationError = 3006,

    // Model Output Malformation Errors (4000-4999)
    ModelOutputMalformed = 4000,
    ModelOutputSchemaViolation = 4001,

    // Vocabulary Errors (5000-5999)
    VocabularyMiss = 5000,
    CanonicalizationFailed = 5001,

    // Client / Input Validation Errors (6000-6999)
    ValidationFailed = 6000,
    InvalidInput = 6001,
    MissingRequiredField = 6002,
    InvalidFormat = 6003,
    ResourceNotFound = 6004,

    // Cache Errors (7000-7999)
    CacheError = 7000,
    CacheMiss = 7001,
}

impl ErrorCode {
    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError
            | ErrorCode::DatabaseMigrationError
            | ErrorCode::SearchEngineError
            | ErrorCode::LlmError
            | ErrorCode::SerializationError
            | ErrorCode::CacheError => 500,

            ErrorCode::ServiceUnavailable
            | ErrorCode::SearchEngineUnavailable
            | ErrorCode::LlmUnavailable => 503,

            ErrorCode::Timeout | ErrorCode::SearchEngineTimeout | ErrorCode::LlmTimeout => 408,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat => 400,

            ErrorCode::ResourceNotFound | ErrorCode::CacheMiss => 404,

            ErrorCode::DatabaseConstraintViolation => 409,

            ErrorCode::ModelOutputMalformed | ErrorCode::ModelOutputSchemaViolation => 422,

            ErrorCode::VocabularyMiss | ErrorCode::CanonicalizationFailed => 200,

            ErrorCode::NotImplemented => 501,
        }
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InternalServerError
            | ErrorCode::ConfigurationError
            | ErrorCode::ServiceUnavailable
            | ErrorCode::Timeout
            | ErrorCode::NotImplemented => "system",

            ErrorCode::DatabaseConnectionError
            | ErrorCode::DatabaseConstraintViolation
            | ErrorCode::DatabaseTransactionError
            | ErrorCode::DatabaseQueryError
            | ErrorCode::DatabaseMigrationError => "database",

            ErrorCode::SearchEngineError
            | ErrorCode::SearchEngineTimeout
            | ErrorCode::SearchEngineUnavailable
            | ErrorCode::LlmError
            | ErrorCode::LlmTimeout
            | ErrorCode::LlmUnavailable
            | ErrorCode::SerializationError => "external_service",

            ErrorCode::ModelOutputMalformed | ErrorCode::ModelOutputSchemaViolation => {
                "model_output"
            }

            ErrorCode::VocabularyMiss | ErrorCode::CanonicalizationFailed => "vocabulary",

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFormat
            | ErrorCode::ResourceNotFound => "client",

            ErrorCode::CacheError | ErrorCode::CacheMiss => "cache",
        }
    }

    /// Check if error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::SearchEngineTimeout
                | ErrorCode::SearchEngineUnavailable
                | ErrorCode::LlmTimeout
                | ErrorCode::LlmUnavailable
                | ErrorCode::ServiceUnavailable
                | ErrorCode::DatabaseConnectionError
                | ErrorCode::CacheError
        )
    }

    /// Check if error should be logged at error level
    pub fn should_log_as_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidInput
                | ErrorCode::MissingRequiredField
                | ErrorCode::InvalidFormat
                | ErrorCode::ResourceNotFound
                | ErrorCode::VocabularyMiss
                | ErrorCode::CanonicalizationFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
