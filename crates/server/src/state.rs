//! Shared application state handed to every axum handler.
//!
//! Grounded on the shape implied by the teacher's `http.rs`/`session.rs`
//! (an `AppState` carrying config plus the session manager) generalized to
//! the trait seams this system actually needs: a document store, cache,
//! LLM gateway, and the two loggers (§6), plus the routing/dialogue
//! orchestrators and the call-state manager.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use recept_config::Settings;
use recept_core::{BlackBoxLogger, CacheLayer, DocumentStore, LlmGateway, TraceLogger};
use recept_dialogue::DialogueTurnProcessor;
use recept_routing::TieredRouter;

use crate::call_state_manager::CallStateManager;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn CacheLayer>,
    pub llm: Arc<dyn LlmGateway>,
    pub trace_logger: Arc<dyn TraceLogger>,
    pub black_box: Arc<dyn BlackBoxLogger>,
    pub router: Arc<TieredRouter>,
    pub dialogue: Arc<DialogueTurnProcessor>,
    pub call_states: Arc<CallStateManager>,
    pub settings: Arc<RwLock<Settings>>,
    pub metrics_handle: PrometheusHandle,
}
