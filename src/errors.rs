use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    /// Deliberately vague: the resolved location is never echoed back.
    #[error("access denied")]
    PathEscape,
    #[error("not found")]
    NotFound,
    #[error("request too large")]
    RequestTooLarge,
    #[error("file too large to preview")]
    TooLarge { size: u64 },
    #[error("database not configured")]
    Unconfigured,
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    QueryFailed(String),
    #[error("{0}")]
    Database(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::PathEscape => "PathEscape",
            AppError::NotFound => "NotFound",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::TooLarge { .. } => "TooLarge",
            AppError::Unconfigured => "Unconfigured",
            AppError::Io(_) | AppError::QueryFailed(_) | AppError::Database(_) => "UpstreamFailure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::PathEscape | AppError::Io(_) | AppError::QueryFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::TooLarge { .. } | AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a filesystem failure, keeping `NotFound` distinct from the rest.
    pub fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound
        } else {
            AppError::Io(err.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let size = match &self {
            AppError::TooLarge { size } => Some(*size),
            _ => None,
        };
        let body = ErrorBody { error: self.to_string(), code: self.code(), size };
        (self.status(), Json(body)).into_response()
    }
}

// Extractor rejections keep their 413 but otherwise become plain bad requests,
// so every failure leaves the server as the same JSON envelope.
fn rejection(status: StatusCode, text: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::RequestTooLarge
    } else {
        AppError::BadRequest(text)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rej: JsonRejection) -> Self {
        rejection(rej.status(), rej.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rej: QueryRejection) -> Self {
        rejection(rej.status(), rej.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rej: MultipartRejection) -> Self {
        rejection(rej.status(), rej.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        rejection(err.status(), err.body_text())
    }
}
