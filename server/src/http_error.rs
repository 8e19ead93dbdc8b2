use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use modelshelf_core::{service::ServiceError, upload::ValidationError};
use tracing::error;

use crate::schema::ErrorBody;

#[derive(Debug)]
pub enum HttpError {
    /// Rejected input, carries the code sent to the client
    BadRequest(&'static str),
    NotFound,
    Internal(eyre::Report),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::BadRequest(code) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: code.to_owned(),
                }),
            )
                .into_response(),
            HttpError::NotFound => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
            HttpError::Internal(err) => {
                error!("request failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal Server Error".to_owned(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationError> for HttpError {
    fn from(err: ValidationError) -> Self {
        HttpError::BadRequest(err.code())
    }
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(err) => err.into(),
            ServiceError::NotFound(_) => HttpError::NotFound,
            ServiceError::Store(err) => HttpError::Internal(err),
        }
    }
}

pub type ApiResult<T> = Result<T, HttpError>;
