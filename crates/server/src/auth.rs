//! Bearer-token authentication middleware (§10: "auth middleware").
//!
//! Grounded on the teacher's `server/src/auth.rs`: extract all config
//! needed synchronously before any `.await` so the `parking_lot::RwLock`
//! guard is never held across an await point, bypass a list of public
//! paths, and compare the provided key in constant time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;
use recept_config::Settings;

static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

const PUBLIC_PATHS: &[&str] = &["/health", "/ready", "/metrics"];

enum AuthCheck {
    Disabled,
    PublicPath,
    CheckKey(String),
}

fn check_auth_config(settings: &Arc<RwLock<Settings>>, path: &str) -> AuthCheck {
    let guard = settings.read();

    if PUBLIC_PATHS.iter().any(|p| path.starts_with(p)) {
        return AuthCheck::PublicPath;
    }

    match &guard.server.bearer_token {
        Some(key) if !key.is_empty() => AuthCheck::CheckKey(key.clone()),
        _ => {
            if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
                tracing::warn!("no bearer_token configured, API authentication is disabled");
            }
            AuthCheck::Disabled
        }
    }
}

/// Checks `Authorization: Bearer <token>` against `server.bearer_token`.
/// Passes through untouched for public paths or when no token is
/// configured (a deployment that wants auth must configure a token).
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let settings = match request.extensions().get::<Arc<RwLock<Settings>>>() {
        Some(settings) => settings.clone(),
        None => {
            tracing::error!("settings extension missing from request");
            return (StatusCode::INTERNAL_SERVER_ERROR, "server configuration error").into_response();
        }
    };

    let path = request.uri().path().to_string();
    let check = check_auth_config(&settings, &path);

    match check {
        AuthCheck::Disabled | AuthCheck::PublicPath => next.run(request).await,
        AuthCheck::CheckKey(expected) => {
            let header = request.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
            match header {
                Some(h) if h.starts_with("Bearer ") => {
                    if constant_time_compare(h[7..].as_bytes(), expected.as_bytes()) {
                        next.run(request).await
                    } else {
                        (StatusCode::UNAUTHORIZED, "invalid API key").into_response()
                    }
                }
                Some(_) => (StatusCode::BAD_REQUEST, "expected Authorization: Bearer <token>").into_response(),
                None => (StatusCode::UNAUTHORIZED, "missing Authorization header").into_response(),
            }
        }
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_compare_matches_equal_slices() {
        assert!(constant_time_compare(b"secret", b"secret"));
        assert!(!constant_time_compare(b"secret", b"secre"));
        assert!(!constant_time_compare(b"secret", b"secreT"));
    }

    #[test]
    fn public_paths_bypass_configured_token() {
        let settings = Arc::new(RwLock::new(Settings::default()));
        settings.write().server.bearer_token = Some("shh".to_string());
        assert!(matches!(check_auth_config(&settings, "/health"), AuthCheck::PublicPath));
        assert!(matches!(check_auth_config(&settings, "/api/query"), AuthCheck::CheckKey(_)));
    }

    #[test]
    fn missing_token_disables_auth() {
        let settings = Arc::new(RwLock::new(Settings::default()));
        assert!(matches!(check_auth_config(&settings, "/api/query"), AuthCheck::Disabled));
    }
}
