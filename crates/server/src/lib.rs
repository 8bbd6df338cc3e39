//! HTTP surface for the tiered routing and response engine (§6 ambient
//! addition): `POST /api/query`, call-state sessions, health/readiness,
//! and Prometheus metrics.

pub mod auth;
pub mod call_state_manager;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod state;

pub use auth::auth_middleware;
pub use call_state_manager::CallStateManager;
pub use http::create_router;
pub use query::{query, QueryContext, QueryMetadata, QueryResult};
pub use state::AppState;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::UnknownTenant(_) => axum::http::StatusCode::NOT_FOUND,
            ServerError::Auth(_) => axum::http::StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let message = self.to_string();
        let status = axum::http::StatusCode::from(self);
        (status, message).into_response()
    }
}
