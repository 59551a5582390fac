use crate::services::{metric_publisher::PublishError, object_lister::ListerError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// A failed scrape: the status returned to the monitoring backend and the
/// message placed in the JSON body. The process keeps serving afterwards.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// 500 when no session could be set up, 502 when the store answered
    /// with an error.
    fn status_for(err: &ListerError) -> StatusCode {
        match err {
            ListerError::SessionInit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ListerError::Listing { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<ListerError> for AppError {
    fn from(err: ListerError) -> Self {
        Self {
            status: Self::status_for(&err),
            message: err.to_string(),
        }
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Count(inner) => inner.into(),
            PublishError::Encoding(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_failures_map_to_500() {
        let err: AppError = ListerError::SessionInit("no AWS region configured".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("no AWS region configured"));
    }

    #[test]
    fn listing_failures_map_to_502() {
        let err: AppError = PublishError::Count(ListerError::Listing {
            bucket: "article-images".into(),
            prefix: "raw/2024/3/7".into(),
            reason: "AccessDenied".into(),
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.message.contains("raw/2024/3/7"));
    }

    #[test]
    fn encoding_failures_map_to_500() {
        let err: AppError = PublishError::Encoding(std::fmt::Error).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("failed to encode metrics"));
    }
}
