//! Binary entry point (§10): load settings, wire the tiered-routing stack,
//! serve the HTTP surface, shut down gracefully on SIGINT/SIGTERM.
//!
//! Grounded on the teacher's `main.rs` wiring shape: `tracing-subscriber`
//! init from `RUST_LOG`, build dependencies bottom-up into one `AppState`,
//! serve with `axum::serve`, tear down on a `tokio::sync::watch` signal
//! shared with the background sweep task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use recept_config::{load_settings, FileDocumentStore};
use recept_core::InMemoryCache;
use recept_dialogue::DialogueTurnProcessor;
use recept_llm::{HttpLlmGateway, RoleConfig};
use recept_routing::TieredRouter;
use recept_server::call_state_manager::CallStateManager;
use recept_server::logging::{TracingBlackBoxLogger, TracingTraceLogger};
use recept_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    let settings = load_settings()?;
    tracing::info!(host = %settings.server.host, port = settings.server.port, "starting server");

    let metrics_handle = recept_server::metrics::install_recorder();

    let dialogue_role = RoleConfig::dialogue(settings.global.dialogue_llm_model.clone(), settings.global.llm_endpoint.clone(), settings.global.llm_api_key.clone());
    let fallback_role = RoleConfig::fallback(settings.global.fallback_llm_model.clone(), settings.global.llm_endpoint.clone(), settings.global.llm_api_key.clone());
    let llm = Arc::new(HttpLlmGateway::new(dialogue_role, fallback_role)?);

    let tenants_dir = std::env::var("RECEPT_TENANTS_DIR").unwrap_or_else(|_| "tenants".to_string());
    let documents = Arc::new(FileDocumentStore::new(tenants_dir));
    let cache = Arc::new(InMemoryCache::new(settings.global.tier3_cache_capacity));
    let trace_logger = Arc::new(TracingTraceLogger);
    let black_box = Arc::new(TracingBlackBoxLogger);

    let router = Arc::new(TieredRouter::new(cache.clone(), llm.clone(), black_box.clone(), documents.clone()));
    let dialogue = Arc::new(DialogueTurnProcessor::new(llm.clone(), trace_logger.clone(), black_box.clone()));

    let call_states = Arc::new(CallStateManager::new(
        100_000,
        Duration::from_secs(settings.global.call_state_ttl_secs),
        Duration::from_secs(60),
    ));
    let shutdown_tx = call_states.start_cleanup_task();

    let state = AppState {
        documents,
        cache,
        llm,
        trace_logger,
        black_box,
        router,
        dialogue,
        call_states,
        settings: Arc::new(RwLock::new(settings.clone())),
        metrics_handle,
    };

    let app = recept_server::http::create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    let _ = shutdown_tx.send(true);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
