//! Error responses for the staff API and the public pages.
//!
//! The staff API answers with `{"error", "code", "fields"?}` JSON; public
//! pages answer with a rendered HTML page (see [`render_error_page`]).

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tera::Context;

use crate::infra::RejsError;
use crate::server::AppState;
use crate::validation::FieldErrors;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body could not be parsed
    InvalidRequestBody,
    /// One or more fields failed validation
    ValidationFailed,
    ResourceNotFound,
    /// Operation conflicts with the current state (e.g. closed recruitment)
    Conflict,
    EncryptionError,
    MailDeliveryFailed,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidRequestBody | ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::EncryptionError
            | ErrorCode::MailDeliveryFailed
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::EncryptionError => "ENCRYPTION_ERROR",
            ErrorCode::MailDeliveryFailed => "MAIL_DELIVERY_FAILED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Human-readable message
    pub error: String,
    pub code: ErrorCode,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldErrors) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code.as_str();
        let mut response = (status, Json(self)).into_response();
        response.headers_mut().insert(
            axum::http::header::HeaderName::from_static("x-error-code"),
            HeaderValue::from_static(code),
        );
        response
    }
}

impl From<RejsError> for ApiError {
    fn from(err: RejsError) -> Self {
        match err {
            RejsError::NotFound { .. } => ApiError::new(ErrorCode::ResourceNotFound, err.to_string()),
            RejsError::Validation(fields) => {
                ApiError::new(ErrorCode::ValidationFailed, "Validation failed").with_fields(fields)
            }
            RejsError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            RejsError::Database(e) => {
                tracing::error!(error = %e, "database error");
                ApiError::new(ErrorCode::DatabaseError, "Database error")
            }
            RejsError::Encryption(e) => {
                tracing::error!(error = %e, "encryption error");
                ApiError::new(ErrorCode::EncryptionError, "Encryption error")
            }
            RejsError::Mail(e) => {
                tracing::error!(error = %e, "mail delivery failed");
                ApiError::new(ErrorCode::MailDeliveryFailed, format!("Mail delivery failed: {e}"))
            }
            other => {
                tracing::error!(error = %other, "internal error");
                ApiError::new(ErrorCode::InternalError, "Internal server error")
            }
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        RejsError::Validation(fields).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequestBody, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(ErrorCode::InvalidRequestBody, rejection.body_text())
    }
}

/// Fallback of the staff API.
pub async fn api_not_found() -> ApiError {
    ApiError::new(ErrorCode::ResourceNotFound, "No such endpoint")
}

// ============================================================================
// HTML Errors
// ============================================================================

/// Failure of a public page handler.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Internal(RejsError),
}

/// Response extension asking [`render_error_page`] for an HTML body.
#[derive(Debug, Clone, Copy)]
struct ErrorPage;

impl From<RejsError> for PageError {
    fn from(err: RejsError) -> Self {
        if err.is_not_found() {
            PageError::NotFound
        } else {
            PageError::Internal(err)
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::Internal(e) => {
                tracing::error!(error = %e, "page handler failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorPage);
        response
    }
}

/// Fallback of the public site.
pub async fn page_not_found() -> PageError {
    PageError::NotFound
}

/// Replace the empty body of a [`PageError`] response with a rendered page.
pub async fn render_error_page(State(state): State<AppState>, response: Response) -> Response {
    if response.extensions().get::<ErrorPage>().is_none() {
        return response;
    }

    let status = response.status();
    let template = if status == StatusCode::NOT_FOUND {
        "pages/not_found.html"
    } else {
        "pages/error.html"
    };
    match state.templates.render(template, &Context::new()) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, template, "error page failed to render");
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(ErrorCode::ValidationFailed.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validation_error_carries_fields() {
        let err: ApiError = FieldErrors::single("amount", "Kwota musi być większa od zera.").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["fields"]["amount"][0], "Kwota musi być większa od zera.");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = RejsError::not_found("trip", 7).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.error, "trip not found: 7");

        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("fields").is_none());
    }

    #[test]
    fn page_error_is_marked_for_rendering() {
        let response = PageError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorPage>().is_some());
    }
}
