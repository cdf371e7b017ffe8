use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// User-visible text for any failure behind the chat endpoint.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An unexpected error occurred while generating the answer. Please try again later.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable")]
    ServiceUnavailable,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::ServiceUnavailable => "service_unavailable",
            ApiError::Internal(_) => "internal_server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            // Details stay in the logs.
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERIC_FAILURE_MESSAGE.to_string(),
            ),
        };

        let body = Json(json!({ "error": self.kind(), "message": message }));
        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::Validation(err.body_text()),
            JsonRejection::JsonSyntaxError(err) => ApiError::Validation(err.body_text()),
            JsonRejection::MissingJsonContentType(err) => ApiError::BadRequest(err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        match rejection {
            FormRejection::FailedToDeserializeForm(err) => ApiError::Validation(err.body_text()),
            FormRejection::FailedToDeserializeFormBody(err) => {
                ApiError::Validation(err.body_text())
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Failure of one of the remote capabilities the pipeline depends on.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("vector index request failed: {0}")]
    VectorIndex(String),
    #[error("language model request failed: {0}")]
    Llm(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ServiceError {
    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::Embedding(err.to_string())
    }

    pub fn index<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::VectorIndex(err.to_string())
    }

    pub fn llm<E: std::fmt::Display>(err: E) -> Self {
        ServiceError::Llm(err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse PDF {path}: {reason}")]
    Pdf { path: String, reason: String },
    #[error("invalid chunking configuration: {0}")]
    Chunking(String),
    #[error("document preparation task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, body) = body_json(ApiError::Internal("pinecone key rejected".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_server_error");
        assert_eq!(body["message"], GENERIC_FAILURE_MESSAGE);
        assert!(!body.to_string().contains("pinecone"));
    }

    #[tokio::test]
    async fn validation_error_is_unprocessable() {
        let (status, body) = body_json(ApiError::Validation("question is empty".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "question is empty");
    }

    #[test]
    fn service_errors_become_internal() {
        let err: ApiError = ServiceError::DimensionMismatch {
            expected: 384,
            actual: 768,
        }
        .into();
        assert!(matches!(err, ApiError::Internal(msg) if msg.contains("384")));
    }
}
