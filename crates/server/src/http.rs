//! HTTP endpoints (§6): `POST /api/query`, health/readiness, metrics.
//!
//! Grounded on the teacher's `create_router`/`build_cors_layer` for the
//! disabled -> no-origins -> all-invalid -> explicit-origins fallback
//! ladder; the session/chat/tools/websocket routes it also carried have
//! no counterpart in a single-endpoint tenant gateway and are dropped.

use axum::extract::{Extension, Json, State};
use axum::http::{HeaderValue, Method};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::metrics::metrics_handler;
use crate::query::{QueryContext, QueryResult};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = {
        let settings = state.settings.read();
        build_cors_layer(&settings.server.cors_allowed_origins, true)
    };
    let settings_extension = state.settings.clone();

    Router::new()
        .route("/api/query", post(query_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(settings_extension))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Methods this gateway's own route table actually needs (`POST
/// /api/query`, the `GET` health/ready/metrics probes, plus the
/// `OPTIONS` preflight every browser client sends first).
const ALLOWED_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::OPTIONS];

/// Dev-only fallback origin used whenever the configured list can't be
/// trusted (empty, or every entry failed to parse).
const DEV_FALLBACK_ORIGIN: &str = "http://localhost:3000";

fn localhost_fallback_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(DEV_FALLBACK_ORIGIN.parse::<HeaderValue>().expect("static origin is always valid"))
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any)
}

/// - Disabled: permissive (only meant for local development).
/// - No configured origins, or every configured origin fails to parse:
///   falls back to `http://localhost:3000`.
/// - Otherwise: the configured list, with credentials allowed — a
///   tenant gateway behind a reverse proxy typically forwards cookies.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins (not for production)");
        return CorsLayer::permissive();
    }

    if origins.is_empty() {
        tracing::info!(fallback = DEV_FALLBACK_ORIGIN, "no CORS origins configured for this tenant gateway");
        return localhost_fallback_layer();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "dropping invalid CORS origin");
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!(configured = origins.len(), "every configured CORS origin was invalid, falling back to localhost");
        return localhost_fallback_layer();
    }

    tracing::info!(count = parsed_origins.len(), dropped = origins.len() - parsed_origins.len(), "CORS configured with explicit origins");
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any)
        .allow_credentials(true)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest {
    tenant_id: String,
    call_id: Option<String>,
    utterance: String,
    #[serde(default)]
    context: QueryContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    call_id: String,
    #[serde(flatten)]
    result: QueryResult,
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, crate::ServerError> {
    let tenant = match state.documents.find_tenant(&request.tenant_id).await {
        Ok(Some(tenant)) => tenant,
        Ok(None) => return Err(crate::ServerError::UnknownTenant(request.tenant_id)),
        Err(err) => {
            tracing::error!(error = %err, tenant_id = %request.tenant_id, "failed to load tenant");
            return Err(crate::ServerError::Internal(err.to_string()));
        }
    };

    let call_id = request.call_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let call_state = state.call_states.take(&call_id);

    let (result, updated_state) = crate::query::query(&state, &tenant, call_state, &request.utterance, &request.context).await;
    state.call_states.store(updated_state);

    Ok(Json(QueryResponse { call_id, result }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "activeCalls": state.call_states.count(),
    }))
}
