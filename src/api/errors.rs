use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::domain::ports::{CacheError, MailError, PaymentError};
use crate::domain::repositories::RepositoryError;

/// API error type with HTTP status code, message and optional detail
///
/// Rendered as the failure envelope:
/// `{"status": "failure", "message": ..., "data": {"error": ...}}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<Value>,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    /// Attaches a detail rendered under `data.error`
    pub fn with_error(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 400 `validation error` with the reason as detail
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::bad_request("validation error").with_error(reason.into())
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = self.detail.unwrap_or_else(|| Value::String(self.message.clone()));
        let body = Json(json!({
            "status": "failure",
            "message": self.message,
            "data": { "error": error }
        }));

        (self.status, body).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::not_found(err.to_string()),
            RepositoryError::Conflict(message) => Self::conflict(message),
            RepositoryError::AlreadyProcessed => Self::forbidden("Already verified"),
            RepositoryError::Rule(message) => Self::bad_request(message),
            RepositoryError::Database(message) => {
                tracing::error!(error = %message, "database error");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        tracing::error!(error = %err, "token store error");
        Self::internal_server_error("Internal server error")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::Expired | AuthError::WrongTokenKind => {
                Self::unauthorized("Invalid or expired token").with_error(err.to_string())
            }
            AuthError::Signing(_) | AuthError::Hashing(_) => {
                tracing::error!(error = %err, "auth failure");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        tracing::warn!(error = %err, "mail delivery failed");
        Self::bad_gateway("Email could not be sent")
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Declined(reason) => {
                Self::bad_request("Transaction failed").with_error(reason)
            }
            PaymentError::Transport(_) | PaymentError::Unexpected(_) => {
                tracing::warn!(error = %err, "payment gateway failure");
                Self::bad_gateway("Payment gateway unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(RepositoryError::NotFound("Account".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RepositoryError::Conflict("taken".into())).status,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RepositoryError::AlreadyProcessed).status,
            StatusCode::FORBIDDEN
        );
        let internal = ApiError::from(RepositoryError::Database("relation missing".into()));
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("relation"));
    }

    #[test]
    fn declined_payment_is_bad_request() {
        let err = ApiError::from(PaymentError::Declined("insufficient funds".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Transaction failed");
    }
}
