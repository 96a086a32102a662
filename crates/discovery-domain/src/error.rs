use thiserror::Error;

/// Errors that can escape the query pipeline as an `Err` value.
///
/// Per the error-handling design, routine stage failures (classifier
/// malfunction, extraction schema violations, rewriter timeouts, explanation
/// generation errors) never reach this type — each stage swallows them and
/// returns its documented neutral result instead. `DomainError` exists only
/// for the genuinely unrecoverable cases (the relational store going down
/// mid-hydration) and for request-input validation at the HTTP boundary.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("company not found: {id}")]
    CompanyNotFound { id: i64 },

    #[error("relational store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("core error: {0}")]
    Core(#[from] discovery_core::Error),

    #[error("invalid request: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {message}")]
    Internal { message: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for DomainError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;
        use serde_json::json;

        let (status, message) = match &self {
            DomainError::CompanyNotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            DomainError::Validation { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            DomainError::Database(_) | DomainError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            DomainError::Core(core_err) => return core_err.clone().into_response(),
            DomainError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization error".to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": "domain_error"
            }
        }));

        (status, body).into_response()
    }
}
