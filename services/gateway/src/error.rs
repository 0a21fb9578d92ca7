use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::ExchangeError;

/// Central error type for the gateway
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Exchange(err) => match err {
                ExchangeError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                ExchangeError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ExchangeError::NotOwner(_) => (StatusCode::FORBIDDEN, "NOT_OWNER"),
                ExchangeError::NotCancellable(_) => (StatusCode::CONFLICT, "NOT_CANCELLABLE"),
                ExchangeError::NotAmendable(_) => (StatusCode::CONFLICT, "NOT_AMENDABLE"),
                ExchangeError::Halted => (StatusCode::INTERNAL_SERVER_ERROR, "HALTED"),
            },
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}
