use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error category: "network", "storage", "not_found", "invalid_input" or "internal"
    pub kind: ErrorKind,
}

/// Coarse error category, carried alongside the message so callers never
/// have to inspect message text to tell an offline device from a bad city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Storage,
    NotFound,
    InvalidInput,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Network(_) => ErrorKind::Network,
            AppError::CityNotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::InvalidInput,
            AppError::InternalError(_) => ErrorKind::Internal,
            AppError::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    /// True when the failure came from the network rather than from storage
    /// or the request itself.
    pub fn is_offline(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match &self {
            AppError::Network(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::CityNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error".to_string(),
                )
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: message,
                kind,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::Network("x".into()).kind(), ErrorKind::Network);
        assert_eq!(AppError::CityNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::BadRequest("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(AppError::InternalError("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_offline_does_not_depend_on_message_text() {
        // A storage failure mentioning "network" is still not an offline signal.
        let err = AppError::InternalError("network share unavailable".into());
        assert!(!err.is_offline());
        assert!(AppError::Network("connection refused".into()).is_offline());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Network("down".into()), StatusCode::BAD_GATEWAY),
            (AppError::CityNotFound("Atlantis".into()), StatusCode::NOT_FOUND),
            (AppError::BadRequest("blank".into()), StatusCode::BAD_REQUEST),
            (
                AppError::DatabaseError(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
