//! LLM gateway seam (C6 data model) and upstream data-access seams
//! (§6 External Interfaces).
//!
//! `LlmGateway` is modeled on the teacher's `LanguageModel` trait
//! (`crates/core/src/traits/llm.rs`): a single async `generate` entry point
//! returning a structured result, with a trait-level default for token
//! estimation. The teacher's trait is role-agnostic; this one is
//! role-scoped because the spec only ever calls two of its three roles
//! from the hot path (§9) — `Admin` exists so tooling can target it
//! explicitly without ever being reachable from `query()`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quick_answer::QuickAnswer;
use crate::scenario::Scenario;
use crate::tenant::Tenant;
use crate::triage::TriageCard;

/// Which configured model a gateway call targets. Only `DialogueLlm` and
/// `FallbackLlm` are ever invoked from `query()`; `Admin` is reserved for
/// out-of-band tooling (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    DialogueLlm,
    FallbackLlm,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system_prompt: String,
    pub user_message: String,
    /// Whether the caller requires a JSON-mode response (Tier-3 fallback
    /// and the dialogue turn processor both do, §4.6/§4.10).
    #[serde(default)]
    pub json_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub latency_ms: u64,
}

#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Invoke the model configured for `role`. Implementations must honor
    /// the role-specific timeout (≈4s dialogue, ≈5s fallback, §4.6) and
    /// translate any failure into `CoreError::LlmUnavailable` carrying the
    /// upstream cause and which brain was targeted.
    async fn generate(&self, role: LlmRole, request: LlmRequest) -> Result<LlmResponse, CoreError>;

    /// Dollar cost of a completed call, for `BudgetLedger::increment_spend`.
    /// Default heuristic mirrors the teacher's `estimate_tokens` fallback:
    /// callers needing precise provider pricing override this.
    fn estimate_cost(&self, response: &LlmResponse) -> f64 {
        let total_tokens = response.prompt_tokens + response.completion_tokens;
        total_tokens as f64 * 0.000_002
    }
}

/// Upstream configuration/content store (§6): tenants, scenarios, triage
/// cards and quick answers are all read through here rather than talking
/// to storage directly from routing/dialogue code.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, CoreError>;
    async fn find_scenarios_for_tenant(&self, tenant_id: &str) -> Result<Vec<Scenario>, CoreError>;
    async fn find_triage_cards(&self, tenant_id: &str) -> Result<Vec<TriageCard>, CoreError>;
    async fn find_quick_answers(&self, tenant_id: &str) -> Result<Vec<QuickAnswer>, CoreError>;
    /// Atomically persist a Tier-3 LLM spend increment against the
    /// tenant's ledger of record (§4.9).
    async fn increment_spend(&self, tenant_id: &str, amount: f64) -> Result<(), CoreError>;
}

/// One structured record of a completed turn, for offline analysis.
/// Grounded on the teacher's `AgentEvent` broadcast shape
/// (`crates/agent/src/agent.rs`), but persisted rather than just broadcast
/// since its purpose here is durable tracing, not live event fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnTrace {
    pub tenant_id: String,
    pub call_id: String,
    pub turn_number: u32,
    pub utterance: String,
    pub response: String,
    pub tier: String,
    pub confidence: f32,
    pub latency_ms: u64,
}

/// Fire-and-forget turn tracing (§4.10 step 9). A logging failure must
/// never fail the call, so this trait has no `Result` in its signature —
/// implementations swallow and log their own errors.
#[async_trait]
pub trait TraceLogger: Send + Sync {
    async fn log_turn(&self, trace: TurnTrace);
}

/// Structured operational events the routing pipeline emits for offline
/// debugging (§4.9's named event constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlackBoxEvent {
    Tier3FastMatch,
    Tier3EmbeddingMatch,
    Tier3LlmFallbackCalled,
    Tier3Exit,
    RoutingError,
    BudgetWarning,
    BudgetExceeded,
    QuickAnswerUsed,
    SectionTrail,
}

#[async_trait]
pub trait BlackBoxLogger: Send + Sync {
    async fn log_event(&self, event: BlackBoxEvent, tenant_id: &str, detail: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeGateway;

    #[async_trait]
    impl LlmGateway for FakeGateway {
        async fn generate(&self, _role: LlmRole, request: LlmRequest) -> Result<LlmResponse, CoreError> {
            Ok(LlmResponse {
                text: format!("echo: {}", request.user_message),
                prompt_tokens: 10,
                completion_tokens: 5,
                latency_ms: 1,
            })
        }
    }

    #[tokio::test]
    async fn default_cost_estimate_is_nonzero_for_nonzero_tokens() {
        let gateway = FakeGateway;
        let response = gateway
            .generate(
                LlmRole::DialogueLlm,
                LlmRequest {
                    system_prompt: "s".into(),
                    user_message: "hi".into(),
                    json_mode: false,
                },
            )
            .await
            .unwrap();
        assert!(gateway.estimate_cost(&response) > 0.0);
    }
}
