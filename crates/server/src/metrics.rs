//! Prometheus metrics (§4 ambient addition, §10): tier selection counters,
//! LLM latency histograms, and budget-exceeded counters, exposed on
//! `/metrics` via `metrics` + `metrics-exporter-prometheus`.
//!
//! Grounded on the dependency choice already carried by the teacher's
//! `server` crate (`metrics`, `metrics-exporter-prometheus`); no direct
//! teacher file survived retrieval, so the recorder functions are named
//! after the routing/dialogue events they observe (§6's `BlackBoxEvent`
//! variants and the tier labels from `recept_routing::Tier`).

use axum::extract::State;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new().install_recorder().expect("failed to install prometheus recorder")
}

pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

pub fn record_query(source: &str, latency_ms: u64) {
    metrics::counter!("recept_query_total", "source" => source.to_string()).increment(1);
    metrics::histogram!("recept_query_latency_ms", "source" => source.to_string()).record(latency_ms as f64);
}

pub fn record_tier_selection(tier: &str) {
    metrics::counter!("recept_tier_selection_total", "tier" => tier.to_string()).increment(1);
}

pub fn record_llm_latency(role: &str, latency_ms: u64) {
    metrics::histogram!("recept_llm_latency_ms", "role" => role.to_string()).record(latency_ms as f64);
}

pub fn record_budget_exceeded(tenant_id: &str) {
    metrics::counter!("recept_budget_exceeded_total", "tenant_id" => tenant_id.to_string()).increment(1);
}

pub fn record_budget_warning(tenant_id: &str) {
    metrics::counter!("recept_budget_warning_total", "tenant_id" => tenant_id.to_string()).increment(1);
}
