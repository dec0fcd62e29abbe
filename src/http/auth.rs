use std::collections::HashSet;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::AppState;
use super::error::ApiError;

/// Fixed set of admin bearer tokens, loaded once at startup.
pub struct TokenStore {
    tokens: HashSet<String>,
}

impl TokenStore {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    /// Parse a comma-separated token list (the `HUDDLE_ADMIN_TOKENS` format).
    pub fn from_env_value(value: &str) -> Self {
        Self::new(value.split(',').map(|t| t.trim().to_string()))
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Middleware guarding the admin routes. Requires `Authorization: Bearer
/// <token>` with a token present in the store.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match check_bearer(&state, &request) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            metrics::counter!(crate::observability::AUTH_FAILURES_TOTAL).increment(1);
            e.into_response()
        }
    }
}

fn check_bearer(state: &AppState, request: &Request) -> Result<(), ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Auth("Authorization header is required"))?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = (parts.next(), parts.next());
    if parts.next().is_some() {
        return Err(ApiError::Auth(
            "Authorization header must be in format: Bearer <token>",
        ));
    }
    let (Some(scheme), Some(token)) = (scheme, token) else {
        return Err(ApiError::Auth(
            "Authorization header must be in format: Bearer <token>",
        ));
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::Auth(
            "Authorization header must be in format: Bearer <token>",
        ));
    }
    if !state.tokens.is_valid(token) {
        return Err(ApiError::Auth("Token is invalid or has expired"));
    }
    Ok(())
}
