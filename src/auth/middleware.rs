//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiKeyStore, ApiKeyValidator, AuthContext, AuthError, API_KEY_PREFIX};

/// Resolves the `Authorization` header to a staff member.
pub struct Authenticator {
    api_key_validator: Arc<ApiKeyValidator>,
    store: Option<Arc<dyn ApiKeyStore>>,
}

impl Authenticator {
    pub fn new(api_key_validator: Arc<ApiKeyValidator>) -> Self {
        Self {
            api_key_validator,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ApiKeyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Authenticate a request
    pub async fn authenticate(&self, auth_header: Option<&str>) -> Result<AuthContext, AuthError> {
        let header = auth_header.ok_or(AuthError::MissingAuth)?;

        let key = if let Some(key) = header.strip_prefix("ApiKey ") {
            key.trim()
        } else if header.starts_with(API_KEY_PREFIX) {
            header
        } else {
            return Err(AuthError::MissingAuth);
        };

        if let Some(context) = self.api_key_validator.lookup(key)? {
            return Ok(context);
        }

        let store = self.store.as_ref().ok_or(AuthError::InvalidApiKey)?;
        match store.get_by_hash(&ApiKeyValidator::hash_key(key)).await? {
            Some(record) if record.active => Ok(AuthContext {
                username: record.username,
            }),
            _ => Err(AuthError::InvalidApiKey),
        }
    }
}

/// Auth context extension for request
#[derive(Clone)]
pub struct AuthContextExt(pub AuthContext);

/// Authentication middleware configuration/state.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub authenticator: Arc<Authenticator>,
    /// If false, requests are treated as fully authorized (dev mode).
    pub require_auth: bool,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let context = match state.authenticator.authenticate(auth_header).await {
        Ok(context) => context,
        Err(e) if state.require_auth => return auth_error_response(e),
        Err(_) => AuthContext::anonymous_admin(),
    };

    tracing::debug!(staff = %context.username, "authenticated");
    request.extensions_mut().insert(AuthContextExt(context));
    next.run(request).await
}

/// Convert auth error to HTTP response
fn auth_error_response(error: AuthError) -> Response {
    let (status, message, code) = match &error {
        AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Missing authentication", "missing_auth"),
        AuthError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key", "invalid_api_key"),
        AuthError::Store(e) => {
            tracing::error!(error = %e, "staff key lookup failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Key store unavailable",
                "service_unavailable",
            )
        }
    };

    (
        status,
        axum::Json(serde_json::json!({
            "error": message,
            "code": code,
        })),
    )
        .into_response()
}
