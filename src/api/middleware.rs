//! API Middleware
//!
//! Trusted identity extraction and request logging. Authentication and
//! authorization decisions happen upstream; the caller supplies a trusted
//! owner identity via headers.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;

/// Role attached to the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRole {
    User,
    Admin,
}

/// Resolved identity of the caller, as asserted by the upstream gateway.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub owner_id: Uuid,
    pub role: OwnerRole,
}

impl OwnerIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == OwnerRole::Admin
    }
}

/// Extract the trusted owner identity from X-Owner-Id / X-Owner-Role.
pub async fn identity_middleware(
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let owner_id_str = match headers.get("X-Owner-Id").and_then(|v| v.to_str().ok()) {
        Some(value) => value,
        None => {
            return Err(AppError::MissingHeader("X-Owner-Id".to_string()).into_response());
        }
    };

    let owner_id = match Uuid::parse_str(owner_id_str) {
        Ok(id) => id,
        Err(_) => {
            return Err(
                AppError::InvalidRequest("Invalid X-Owner-Id header format".to_string())
                    .into_response(),
            );
        }
    };

    let role = match headers.get("X-Owner-Role").and_then(|v| v.to_str().ok()) {
        Some("admin") => OwnerRole::Admin,
        _ => OwnerRole::User,
    };

    request
        .extensions_mut()
        .insert(OwnerIdentity { owner_id, role });

    Ok(next.run(request).await)
}

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}
