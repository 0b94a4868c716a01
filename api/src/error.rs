//! Error types for the API.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use onnxai_model_cache::ModelCacheError;
use onnxai_pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types following RFC 7807 Problem Details.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - malformed request or undecodable image
    BadRequest(String),

    /// Validation error (400) - a specific form field is missing or invalid
    ValidationError {
        /// The field that failed validation
        field: String,
        /// The validation error message
        message: String,
    },

    /// Not found (404) - model or registry entry doesn't exist
    NotFound(String),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Internal server error (500) - model failed to load or run
    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            Self::ValidationError { field, message } => {
                write!(f, "Validation Error [field: {}]: {}", field, message)
            }
            Self::NotFound(msg) => write!(f, "Not Found: {}", msg),
            Self::PayloadTooLarge(msg) => write!(f, "Payload Too Large: {}", msg),
            Self::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Shorthand for a missing multipart field
    pub fn missing_field(field: &str) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: "field is required".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// RFC 7807 Problem Details response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary
    pub title: String,

    /// HTTP status code
    pub status: u16,

    /// Human-readable explanation
    pub detail: String,

    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<serde_json::Value>,
}

impl ProblemDetails {
    fn from_error(err: &ApiError) -> Self {
        let status = err.status();
        let (title, detail, errors) = match err {
            ApiError::BadRequest(msg) => ("Bad Request", msg.clone(), None),
            ApiError::ValidationError { field, message } => (
                "Validation Error",
                format!("Field '{}': {}", field, message),
                Some(serde_json::json!({ field: message })),
            ),
            ApiError::NotFound(msg) => ("Not Found", msg.clone(), None),
            ApiError::PayloadTooLarge(msg) => ("Payload Too Large", msg.clone(), None),
            ApiError::InternalError(msg) => ("Internal Server Error", msg.clone(), None),
        };

        Self {
            type_uri: format!(
                "https://onnxai.dev/errors/{}",
                title.to_lowercase().replace(' ', "-")
            ),
            title: title.to_string(),
            status: status.as_u16(),
            detail,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(ProblemDetails::from_error(&self))).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidImage(msg) => {
                ApiError::BadRequest(format!("Invalid image: {}", msg))
            }
            PipelineError::ModelNotFound(model) => ApiError::NotFound(format!(
                "Model '{}' not found in registry. View available models at: GET /registry",
                model
            )),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<ModelCacheError> for ApiError {
    fn from(err: ModelCacheError) -> Self {
        match err {
            ModelCacheError::RegistryNotFound(root) => ApiError::NotFound(format!(
                "Model registry directory {} does not exist",
                root.display()
            )),
            ModelCacheError::Io(e) => ApiError::InternalError(e.to_string()),
            other => ApiError::NotFound(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status() {
        let cases = [
            (PipelineError::InvalidImage("x".into()), StatusCode::BAD_REQUEST),
            (PipelineError::ModelNotFound("x".into()), StatusCode::NOT_FOUND),
            (PipelineError::ExecutionFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (PipelineError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_registry_errors_are_not_found() {
        let err = ApiError::from(ModelCacheError::RegistryNotFound("/nope".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(ModelCacheError::InvalidModelId("..".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_problem_details_shape() {
        let problem = ProblemDetails::from_error(&ApiError::missing_field("model_name"));
        let json = serde_json::to_value(&problem).unwrap();

        assert_eq!(json["type"], "https://onnxai.dev/errors/validation-error");
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"]["model_name"], "field is required");
    }
}
