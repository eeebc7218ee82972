//! API Error Responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use stock_advisor::{AdvisorError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Advisor(#[from] AdvisorError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Advisor(AdvisorError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Advisor(e) => match e.kind() {
                ErrorKind::DataInsufficient => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
                ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest(msg) => ErrorResponse {
                error: msg.clone(),
                code: ErrorKind::InvalidInput.code().into(),
            },
            ApiError::Advisor(e) => ErrorResponse {
                error: e.user_message(),
                code: e.kind().code().into(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let status = |e: AdvisorError| ApiError::from(e).status();

        assert_eq!(status(AdvisorError::DataInsufficient("x".into())), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status(AdvisorError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AdvisorError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AdvisorError::upstream("Yahoo", "down")), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status(AdvisorError::Timeout { source_name: "Yahoo".into(), secs: 10 }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(status(AdvisorError::ModelUnavailable("x".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(AdvisorError::Config("x".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_code() {
        let body = ApiError::from(AdvisorError::ModelUnavailable("missing file".into())).body();
        assert_eq!(body.code, "MODEL_UNAVAILABLE");
        assert!(!body.error.contains("missing file"));
    }
}
