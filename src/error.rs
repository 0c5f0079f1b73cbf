use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::color::ColorError;
use crate::services::export::ExportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),

    #[error("Rendering failure: {0}")]
    Rendering(#[from] ExportError),

    #[error("Internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<ColorError> for AppError {
    fn from(err: ColorError) -> Self {
        AppError::InvalidColorFormat(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidColorFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rendering(e) => {
                error!("export rendering failed: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "导出失败，请稍后重试".to_string(),
                )
            }
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
        });

        (status, body).into_response()
    }
}
