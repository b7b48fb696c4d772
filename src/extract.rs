use axum::extract::{rejection::PathRejection, FromRequestParts};

use crate::AppError;

/// `axum::extract::Path` answering a bad segment with the usual `{message}` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidOperation(rejection.body_text())
    }
}
