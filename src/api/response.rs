use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Success envelope: `{"status": "success", "message": ..., "data": ...}`
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    message: String,
    data: Value,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    pub fn created(message: impl Into<String>, data: impl Serialize) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::error!(error = %e, "response serialization failed");
            Value::Null
        });
        Self {
            status,
            message: message.into(),
            data,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "status": "success",
            "message": self.message,
            "data": self.data,
        }));
        (self.status, body).into_response()
    }
}

pub type ApiResult = Result<ApiResponse, crate::api::errors::ApiError>;
