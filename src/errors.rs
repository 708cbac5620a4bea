use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-specific error types.
///
/// The variant is chosen where the failure happens; `into_response` only renders it.
#[derive(Debug, Clone)]
pub enum AppError {
    /// The request body did not match the endpoint's schema.
    Validation {
        message: String,
        details: Vec<FieldError>,
    },
    /// The YGL API failed, timed out or answered with a non-2xx status.
    Upstream {
        /// Upstream HTTP status, `None` when no response was received.
        status: Option<u16>,
        message: String,
        details: Option<Value>,
    },
    /// No route matched the request.
    NotFound(String),
    /// Anything else.
    Internal(String),
}

impl AppError {
    pub fn validation(details: Vec<FieldError>) -> Self {
        let message = match details.as_slice() {
            [single] => format!("{}: {}", single.field, single.message),
            _ => format!("{} fields failed validation", details.len()),
        };
        AppError::Validation { message, details }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Upstream { .. } => "YGL_UPSTREAM_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The uniform `{status, code, message, details}` error object.
    pub fn to_body(&self) -> Value {
        let (message, details) = match self {
            AppError::Validation { message, details } => (message.clone(), json!(details)),
            AppError::Upstream {
                message, details, ..
            } => (message.clone(), details.clone().unwrap_or(Value::Null)),
            AppError::NotFound(msg) => (msg.clone(), Value::Null),
            // Internal details stay in the logs.
            AppError::Internal(_) => ("Internal server error".to_string(), Value::Null),
        };

        json!({
            "status": self.status().as_u16(),
            "code": self.code(),
            "message": message,
            "details": details,
        })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { message, .. } => write!(f, "Validation error: {}", message),
            AppError::Upstream {
                status: Some(status),
                message,
                ..
            } => write!(f, "YGL upstream error ({}): {}", status, message),
            AppError::Upstream { message, .. } => write!(f, "YGL upstream error: {}", message),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into the `{success: false, error}` envelope.
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation { message, .. } => {
                tracing::debug!("Rejected request: {}", message);
            }
            AppError::Upstream { .. } => tracing::error!("{}", self),
            AppError::NotFound(msg) => tracing::debug!("Not found: {}", msg),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_body(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Transport failures carry the upstream status when one was received.
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "YGL request timed out".to_string()
        } else {
            format!("YGL request failed: {}", err)
        };
        AppError::Upstream {
            status: err.status().map(|s| s.as_u16()),
            message,
            details: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::validation(vec![FieldError::new("beds_min", "must be >= 0")]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let body = err.to_body();
        assert_eq!(body["status"], 400);
        assert_eq!(body["message"], "beds_min: must be >= 0");
        assert_eq!(body["details"][0]["field"], "beds_min");
    }

    #[test]
    fn test_upstream_uses_upstream_status() {
        let err = AppError::Upstream {
            status: Some(503),
            message: "unavailable".to_string(),
            details: Some(json!({"raw": "down"})),
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_body()["details"]["raw"], "down");
    }

    #[test]
    fn test_upstream_without_status_is_bad_gateway() {
        let err = AppError::Upstream {
            status: None,
            message: "connection refused".to_string(),
            details: None,
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "YGL_UPSTREAM_ERROR");
    }

    #[test]
    fn test_internal_hides_message() {
        let err = AppError::Internal("cache exploded".to_string());
        let body = err.to_body();
        assert_eq!(body["status"], 500);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_not_found_code() {
        let err = AppError::NotFound("GET /nope".to_string());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_body()["code"], "NOT_FOUND");
    }
}
