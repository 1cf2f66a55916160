use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::session::View;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("login required")]
    NotLoggedIn,

    #[error("view {0} is not available for this account")]
    ViewNotAllowed(View),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("could not read the body-composition sheet; retry with a clearer photo or enter the values manually")]
    ScanUnreadable,

    #[error("the session changed while the request was running")]
    SessionChanged,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotLoggedIn => StatusCode::UNAUTHORIZED,
            ApiError::ViewNotAllowed(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ScanUnreadable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::SessionChanged => StatusCode::CONFLICT,
            ApiError::Store(ref e) => {
                error!(error = %e, "store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
