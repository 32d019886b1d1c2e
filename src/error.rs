use axum::http::StatusCode;
use thiserror::Error;

/// Engine error taxonomy.
///
/// `Validation` rejects malformed input to a pure computation,
/// `DependencyDegraded` marks unusable data from the text-generation
/// service (always recoverable for enrichments), `Storage` is a retryable
/// durable-store failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DependencyDegraded(String),

    #[error("storage: {0}")]
    Storage(#[source] anyhow::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn degraded(msg: impl Into<String>) -> Self {
        Self::DependencyDegraded(msg.into())
    }
}

/// Maps an engine error onto the HTTP surface.
pub fn http(e: EngineError) -> (StatusCode, String) {
    let status = match &e {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DependencyDegraded(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
