//! API 错误类型与 HTTP 状态映射。

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use filedeck_api_types::ErrorResponse;
use system_capabilities::FileSystemError;
use tracing::{error, warn};

/// API 错误类型。
#[derive(Debug)]
pub struct ApiError {
    message: String,
    code: &'static str,
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            status,
        }
    }
}

impl From<FileSystemError> for ApiError {
    fn from(err: FileSystemError) -> Self {
        match err {
            FileSystemError::MissingArgument(field) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "MISSING_ARGUMENT",
                format!("{} is required", field),
            ),
            FileSystemError::InvalidInput(reason) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", reason)
            }
            FileSystemError::Forbidden(path) => ApiError::new(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("Access outside base directory is not allowed: {}", path),
            ),
            FileSystemError::PathNotFound(path) => ApiError::new(
                StatusCode::NOT_FOUND,
                "PATH_NOT_FOUND",
                format!("Path not found: {}", path),
            ),
            FileSystemError::NotADirectory(path) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "NOT_A_DIRECTORY",
                format!("Not a directory: {}", path),
            ),
            FileSystemError::SourceMissing(path) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "SOURCE_MISSING",
                format!("Source file does not exist: {}", path),
            ),
            FileSystemError::DestinationMissing(path) => ApiError::new(
                StatusCode::NOT_FOUND,
                "DESTINATION_MISSING",
                format!("Target folder does not exist: {}", path),
            ),
            FileSystemError::AlreadyExists(path) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "ALREADY_EXISTS",
                format!("Already exists: {}", path),
            ),
            FileSystemError::PermissionDenied(path) => ApiError::new(
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                format!("Permission denied: {}", path),
            ),
            FileSystemError::Domain(e) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                e.to_string(),
            ),
            FileSystemError::Io(e) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                format!("IO error: {}", e),
            ),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        ApiError::new(status, "INVALID_INPUT", err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, error = %self.message, "request failed");
        } else {
            warn!(code = self.code, status = %self.status, error = %self.message, "request rejected");
        }

        let body = Json(ErrorResponse::new(self.code, self.message));
        (self.status, body).into_response()
    }
}
