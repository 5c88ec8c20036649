use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use followup_core::FollowUpError;
use followup_portal::PortalError;

use crate::models::ErrorRes;

/// Error returned by handlers, rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<FollowUpError> for ApiError {
    fn from(err: FollowUpError) -> Self {
        let status = match &err {
            FollowUpError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            FollowUpError::UploadFileNotFound(_) => StatusCode::NOT_FOUND,
            FollowUpError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        let status = match &err {
            PortalError::FileMissing(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status.as_u16(), self.detail);
        } else {
            tracing::warn!("{} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(ErrorRes { detail: self.detail })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
