use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::friendship::FriendError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("Unauthorized - {0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState(_)
            | AppError::Conflict(_)
            | AppError::InvalidOperation(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Internal(err) => {
                error!("{err:#}\n{}", err.backtrace());
                "Internal server error".to_owned()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<FriendError> for AppError {
    fn from(err: FriendError) -> Self {
        use FriendError::*;
        match err {
            NotFound(msg) => AppError::NotFound(msg.to_owned()),
            Forbidden(msg) => AppError::Forbidden(msg.to_owned()),
            InvalidState(msg) => AppError::InvalidState(msg.to_owned()),
            Conflict(msg) => AppError::Conflict(msg.to_owned()),
            InvalidOperation(msg) => AppError::InvalidOperation(msg.to_owned()),
            Store(err) => AppError::Internal(err.into()),
        }
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(tower_sessions::session::Error);
