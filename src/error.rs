use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::parcel::ParcelStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid status value: {0}")]
    InvalidStatusValue(String),

    #[error("invalid status transition from {from} to {to}")]
    IllegalTransition { from: ParcelStatus, to: ParcelStatus },

    #[error("parcel has not been delivered yet")]
    ParcelNotYetDelivered,

    #[error("payment has already been collected")]
    PaymentAlreadyCollected,

    #[error("not authorized to modify this parcel")]
    NotAuthorized,

    #[error("parcel {0} not found")]
    ParcelNotFound(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidStatusValue(_)
            | AppError::IllegalTransition { .. }
            | AppError::ParcelNotYetDelivered
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotAuthorized | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ParcelNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::PaymentAlreadyCollected => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
