//! Error types for web handlers.
//!
//! [`AppError`] bridges [`ConferenceError`] and HTTP responses: every
//! domain error maps to a status code and a stable error code, rendered as
//! `{ "code": ..., "message": ... }`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use conference_core::error::ConferenceError;
use serde::Serialize;
use std::fmt;

/// Error returned by handlers.
///
/// ```ignore
/// async fn get_conference(
///     State(app): State<AppState>,
///     Path(key): Path<String>,
/// ) -> Result<Json<Conference>, AppError> {
///     Ok(Json(app.service.get_conference(&key).await?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    /// Shown to the client
    message: String,
    /// Stable machine-readable code
    code: &'static str,
    /// Logged, never serialized
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with an explicit status and code
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attaches the underlying failure for the logs
    #[must_use]
    pub fn with_source(self, source: anyhow::Error) -> Self {
        Self {
            source: Some(source),
            ..self
        }
    }

    /// 400 `BAD_REQUEST`
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }

    /// 401 `UNAUTHENTICATED`
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHENTICATED")
    }

    /// 500 `INTERNAL_SERVER_ERROR`
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL_SERVER_ERROR")
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Stable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Client-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let source = self.source.as_ref().map(ToString::to_string);
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                source = source.as_deref().unwrap_or("none"),
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                "Request rejected"
            );
        }

        metrics::counter!("http_errors_total", "code" => self.code).increment(1);

        let body = Json(ErrorBody {
            code: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ConferenceError> for AppError {
    fn from(err: ConferenceError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Backend details stay in the logs
        let message = match &err {
            ConferenceError::Store(_) => "An internal error occurred".to_string(),
            ConferenceError::Cache(_) => "Announcement cache unavailable".to_string(),
            other => other.to_string(),
        };

        let app = Self::new(status, message, err.code());
        if status.is_server_error() {
            app.with_source(anyhow::Error::new(err))
        } else {
            app
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
