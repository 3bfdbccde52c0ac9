use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ray_core::RayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} request failed with status {status}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: Value,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error body shared by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            },
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(message) => ErrorResponse {
                error: "Bad request".to_string(),
                message: Some(message),
                details: None,
            },
            ApiError::Unauthorized => ErrorResponse {
                error: "Unauthorized".to_string(),
                message: Some("missing or invalid X-App-Token".to_string()),
                details: None,
            },
            ApiError::MethodNotAllowed => ErrorResponse {
                error: "Method not allowed".to_string(),
                message: None,
                details: None,
            },
            ApiError::Config(message) => ErrorResponse {
                error: "Server configuration error".to_string(),
                message: Some(message),
                details: None,
            },
            ApiError::Upstream {
                service,
                status,
                body,
            } => ErrorResponse {
                error: format!("{service} request failed"),
                message: Some(format!("upstream returned HTTP {status}")),
                details: Some(body),
            },
            ApiError::Internal(message) => ErrorResponse {
                error: "Internal server error".to_string(),
                message: Some(message),
                details: None,
            },
        }
    }
}

impl From<RayError> for ApiError {
    fn from(err: RayError) -> Self {
        match err {
            RayError::MissingCredential { .. } => ApiError::Config(err.to_string()),
            RayError::Upstream {
                service,
                status,
                body,
            } => ApiError::Upstream {
                service,
                status,
                body,
            },
            RayError::InvalidInput(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
