use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::AppConfig;

/// An Axum middleware that rejects obviously malformed requests before routing.
///
/// This middleware checks for:
/// - Path traversal attempts in the request URI.
/// - Suspicious user agents (logged only).
/// - A declared body larger than `server.max_body_bytes` on write methods.
pub async fn validate_request_middleware(
    State(cfg): State<Arc<AppConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let uri_path = req.uri().path();
    if contains_path_traversal(uri_path) {
        return reject(StatusCode::BAD_REQUEST, "INVALID_PATH", "Path traversal detected in request".to_string());
    }

    if let Some(user_agent) = req.headers().get("user-agent") {
        if let Ok(ua_str) = user_agent.to_str() {
            if is_suspicious_user_agent(ua_str) {
                tracing::warn!("Suspicious user agent detected: {}", ua_str);
            }
        }
    }

    // Early rejection; DefaultBodyLimit still guards bodies without a content-length
    if matches!(req.method(), &Method::POST | &Method::PUT | &Method::PATCH) {
        let declared = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(length) = declared {
            let max_body_size = cfg.server.max_body_bytes;
            if length > max_body_size {
                return reject(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    format!("Request body exceeds maximum size of {} bytes", max_body_size),
                );
            }
        }
    }

    next.run(req).await
}

fn reject(status: StatusCode, code: &str, message: String) -> Response {
    (
        status,
        Json(json!({
            "message": message,
            "error": {
                "code": code,
                "message": message,
            },
            "status": status.as_u16(),
        })),
    )
        .into_response()
}

/// Check if a path contains traversal sequences, plain or URL-encoded
pub(crate) fn contains_path_traversal(path: &str) -> bool {
    let lower = path.to_lowercase();

    if path.contains("/..") || path.contains("\\..") || path.starts_with("..") {
        return true;
    }
    if path.contains("/./") || path.contains("\\.\\") {
        return true;
    }

    let encoded_patterns = [
        "%2e%2e",
        "%252e%252e", // .. and double-encoded ..
        "%2e/",
        "%252e%2f", // ./
        "/%2e",
        "%2f%2e", // /.
        "%2e%5c", // .\\
        "%5c%2e",
        "%00", // Null byte
    ];
    if encoded_patterns.iter().any(|p| lower.contains(p)) {
        return true;
    }

    path.contains('\0')
}

/// Check for suspicious user agents (simple heuristic)
fn is_suspicious_user_agent(ua: &str) -> bool {
    let ua_lower = ua.to_lowercase();
    ua_lower.contains("sqlmap")
        || ua_lower.contains("nikto")
        || ua_lower.contains("havij")
        || ua_lower.contains("acunetix")
        || ua_lower.contains("scanner")
}
