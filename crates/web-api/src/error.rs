use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, RepositoryError};
use serde::Serialize;

/// 错误响应体，接口约定的形状是 {error, statusCode}
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 实时通道复用同一套映射，取人类可读的错误文本
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Domain(domain) => match &domain {
                DomainError::InvalidArgument { .. } => {
                    ApiError::new(StatusCode::BAD_REQUEST, domain.to_string())
                }
                DomainError::Unauthorized => {
                    ApiError::new(StatusCode::UNAUTHORIZED, domain.to_string())
                }
                DomainError::Forbidden { .. } => {
                    ApiError::new(StatusCode::FORBIDDEN, domain.to_string())
                }
                DomainError::NotFound { .. } => {
                    ApiError::new(StatusCode::NOT_FOUND, domain.to_string())
                }
                DomainError::Conflict { .. } => {
                    ApiError::new(StatusCode::CONFLICT, domain.to_string())
                }
            },
            ApplicationError::Repository(repo) => match repo {
                RepositoryError::NotFound => {
                    ApiError::new(StatusCode::NOT_FOUND, "requested resource not found")
                }
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "resource already exists")
                }
                RepositoryError::Storage { message } => {
                    tracing::error!(error = %message, "存储错误");
                    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage error")
                }
            },
            ApplicationError::Password(err) => {
                tracing::error!(error = %err, "密码哈希错误");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            status_code: self.status.as_u16(),
        };
        (self.status, Json(body)).into_response()
    }
}
