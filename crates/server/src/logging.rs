//! Tracing-backed `TraceLogger`/`BlackBoxLogger` sinks (§6 ambient
//! addition): every completed turn and every named operational event
//! (§4.9) becomes a structured `tracing` record rather than a no-op, so a
//! deployment gets offline-debuggable logs out of the box without wiring
//! up a separate store.

use async_trait::async_trait;
use recept_core::{BlackBoxEvent, BlackBoxLogger, TraceLogger, TurnTrace};

pub struct TracingTraceLogger;

#[async_trait]
impl TraceLogger for TracingTraceLogger {
    async fn log_turn(&self, trace: TurnTrace) {
        tracing::info!(
            tenant_id = %trace.tenant_id,
            call_id = %trace.call_id,
            turn_number = trace.turn_number,
            tier = %trace.tier,
            confidence = trace.confidence,
            latency_ms = trace.latency_ms,
            "turn trace"
        );
    }
}

pub struct TracingBlackBoxLogger;

#[async_trait]
impl BlackBoxLogger for TracingBlackBoxLogger {
    async fn log_event(&self, event: BlackBoxEvent, tenant_id: &str, detail: &str) {
        match event {
            BlackBoxEvent::BudgetExceeded => {
                tracing::warn!(event = ?event, tenant_id, detail, "black box event");
                crate::metrics::record_budget_exceeded(tenant_id);
            }
            BlackBoxEvent::BudgetWarning => {
                tracing::warn!(event = ?event, tenant_id, detail, "black box event");
                crate::metrics::record_budget_warning(tenant_id);
            }
            BlackBoxEvent::RoutingError => {
                tracing::warn!(event = ?event, tenant_id, detail, "black box event");
            }
            _ => {
                tracing::info!(event = ?event, tenant_id, detail, "black box event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loggers_accept_every_event_variant_without_panicking() {
        let logger = TracingBlackBoxLogger;
        for event in [
            BlackBoxEvent::Tier3FastMatch,
            BlackBoxEvent::Tier3EmbeddingMatch,
            BlackBoxEvent::Tier3LlmFallbackCalled,
            BlackBoxEvent::Tier3Exit,
            BlackBoxEvent::RoutingError,
            BlackBoxEvent::BudgetWarning,
            BlackBoxEvent::BudgetExceeded,
            BlackBoxEvent::QuickAnswerUsed,
            BlackBoxEvent::SectionTrail,
        ] {
            logger.log_event(event, "t1", "detail").await;
        }
    }
}
