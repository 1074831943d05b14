//! JSON error envelope returned by every endpoint

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error categories reported in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    NotFoundError,
    BudgetExceededError,
    TimeoutError,
    UpstreamError,
    ServerError,
    ServiceUnavailableError,
}

impl std::fmt::Display for ApiErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestError => write!(f, "invalid_request_error"),
            Self::NotFoundError => write!(f, "not_found_error"),
            Self::BudgetExceededError => write!(f, "budget_exceeded_error"),
            Self::TimeoutError => write!(f, "timeout_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::ServerError => write!(f, "server_error"),
            Self::ServiceUnavailableError => write!(f, "service_unavailable_error"),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(
        status: StatusCode,
        error_type: ApiErrorType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    param: None,
                    code: None,
                },
            },
        }
    }

    /// Add parameter info
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.response.error.param = Some(param.into());
        self
    }

    /// Add error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    /// Spend limit reached
    pub fn payment_required(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PAYMENT_REQUIRED,
            ApiErrorType::BudgetExceededError,
            message,
        )
    }

    /// Request deadline expired or the client went away
    pub fn request_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, ApiErrorType::TimeoutError, message)
    }

    /// Upstream provider failed or timed out
    pub fn upstream(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, ApiErrorType::UpstreamError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// Service unavailable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorType::ServiceUnavailableError,
            message,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();

        match err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::DimensionMismatch { .. } => Self::bad_request(message)
                .with_param("embedding")
                .with_code("dimension_mismatch"),
            DomainError::ProviderTimeout { .. } => {
                Self::upstream(StatusCode::GATEWAY_TIMEOUT, message).with_code("provider_timeout")
            }
            DomainError::Provider { .. } => {
                Self::upstream(StatusCode::BAD_GATEWAY, message).with_code("provider_error")
            }
            DomainError::AllProvidersExhausted { .. } => {
                Self::unavailable(message).with_code("all_providers_exhausted")
            }
            DomainError::BudgetExceeded { message } => {
                Self::payment_required(message).with_code("budget_exceeded")
            }
            DomainError::CacheDegraded { .. } | DomainError::IndexDegraded { .. } => {
                Self::unavailable(message)
            }
            DomainError::Cancelled { message } => Self::request_timeout(message),
            DomainError::Configuration { message } | DomainError::Internal { message } => {
                Self::internal(message)
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.error_type, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::bad_request("Query text is empty");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.error_type, ApiErrorType::InvalidRequestError);
        assert_eq!(err.response.error.message, "Query text is empty");
    }

    #[test]
    fn test_api_error_with_param() {
        let err = ApiError::bad_request("Invalid value")
            .with_param("top_k")
            .with_code("invalid_type");

        assert_eq!(err.response.error.param, Some("top_k".to_string()));
        assert_eq!(err.response.error.code, Some("invalid_type".to_string()));
    }

    #[test]
    fn test_domain_error_conversion() {
        let cases = [
            (DomainError::not_found("doc"), StatusCode::NOT_FOUND),
            (DomainError::validation("empty"), StatusCode::BAD_REQUEST),
            (DomainError::dimension_mismatch(4, 3), StatusCode::BAD_REQUEST),
            (DomainError::provider_timeout("openai", 10), StatusCode::GATEWAY_TIMEOUT),
            (DomainError::provider("openai", "500"), StatusCode::BAD_GATEWAY),
            (
                DomainError::all_providers_exhausted(vec!["gpt-4o".to_string()]),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (DomainError::budget_exceeded("daily"), StatusCode::PAYMENT_REQUIRED),
            (DomainError::cancelled("deadline"), StatusCode::REQUEST_TIMEOUT),
            (DomainError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain_err, status) in cases {
            let api_err: ApiError = domain_err.into();
            assert_eq!(api_err.status, status);
        }
    }

    #[test]
    fn test_exhausted_error_names_attempted_models() {
        let api_err: ApiError =
            DomainError::all_providers_exhausted(vec!["a".to_string(), "b".to_string()]).into();

        assert!(api_err.response.error.message.contains("a, b"));
        assert_eq!(
            api_err.response.error.code.as_deref(),
            Some("all_providers_exhausted")
        );
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::payment_required("Monthly budget exhausted");
        let json = serde_json::to_string(&err.response).unwrap();

        assert!(json.contains("budget_exceeded_error"));
        assert!(json.contains("Monthly budget exhausted"));
    }
}
