use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    #[error("Admin access required")]
    Forbidden,

    #[error("{0}")]
    Gateway(String),

    #[error("{0}")]
    DbError(#[from] sqlx::Error),

    #[error("{0}")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            AppError::Unauthorized { code, .. } => (StatusCode::UNAUTHORIZED, Some(*code)),
            AppError::Forbidden => (StatusCode::FORBIDDEN, None),
            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, None),
            AppError::DbError(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            AppError::OrmError(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
