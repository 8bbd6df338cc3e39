//! TieredRouter (C9, §4.9) — Tier1 -> Tier2 -> Tier3 escalation.
//!
//! Grounded on `recept_core::cache::CacheLayer` and `BudgetLedger` for the
//! shared-resource plumbing, and on `recept_dialogue`'s turn processor for
//! the shape of "build a prompt, call the gateway, parse JSON, degrade on
//! failure" — here applied to a scenario-routing prompt instead of a
//! conversational reply.

use std::sync::Arc;
use std::time::{Duration, Instant};

use recept_core::{
    cache_key, BlackBoxEvent, BlackBoxLogger, CacheLayer, DocumentStore, LlmGateway, LlmRequest, LlmRole, Scenario,
    Tenant,
};
use serde::Deserialize;

use crate::selector::{HybridScenarioSelector, MatchContext};

const TIER3_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    One,
    Two,
    Three,
}

#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub scenario_id: String,
    pub confidence: f32,
    pub tier: Tier,
    pub cost: f64,
    pub cached: bool,
}

#[derive(Debug, Deserialize)]
struct Tier3Reply {
    #[serde(rename = "scenarioId")]
    scenario_id: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

pub struct TieredRouter {
    cache: Arc<dyn CacheLayer>,
    llm: Arc<dyn LlmGateway>,
    black_box: Arc<dyn BlackBoxLogger>,
    documents: Arc<dyn DocumentStore>,
}

impl TieredRouter {
    pub fn new(
        cache: Arc<dyn CacheLayer>,
        llm: Arc<dyn LlmGateway>,
        black_box: Arc<dyn BlackBoxLogger>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self { cache, llm, black_box, documents }
    }

    /// Route a single query for `tenant`. Returns `None` on no-match at any
    /// tier, budget gate, or an unrecoverable Tier-3 failure — never an
    /// error (§7: the only user-visible failure mode is `response=null`).
    pub async fn route(&self, tenant: &Tenant, query: &str, scenarios: &[Scenario], context: &MatchContext) -> Option<RouteMatch> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }

        let normalized = crate::selector::normalize(trimmed);
        let key = cache_key(&tenant.tenant_id, &normalized);
        if let Some(cached) = self.cache.get(&key).await {
            if let Some((scenario_id, confidence)) = cached.split_once('\u{1}') {
                if let Ok(confidence) = confidence.parse::<f32>() {
                    return Some(RouteMatch { scenario_id: scenario_id.to_string(), confidence, tier: Tier::Three, cost: 0.0, cached: true });
                }
            }
        }

        if let Some(tier1) = HybridScenarioSelector::select(trimmed, scenarios, context) {
            if tier1.confidence >= tenant.tier_thresholds.tier1_confidence {
                return Some(RouteMatch { scenario_id: tier1.scenario_id, confidence: tier1.confidence, tier: Tier::One, cost: 0.0, cached: false });
            }
        }

        if let Some(tier2) = recept_knowledge::SemanticMatcher::build(scenarios).best_match(trimmed, tenant.tier_thresholds.tier2_confidence) {
            return Some(RouteMatch { scenario_id: tier2.scenario_id, confidence: tier2.confidence, tier: Tier::Two, cost: 0.0, cached: false });
        }

        self.tier3(tenant, trimmed, scenarios, &key).await
    }

    async fn tier3(&self, tenant: &Tenant, query: &str, scenarios: &[Scenario], cache_key: &str) -> Option<RouteMatch> {
        if !tenant.features.enable_3_tier_intelligence || !tenant.features.enable_llm_fallback {
            return None;
        }
        let ledger = tenant.budget_ledger();
        let estimated_cost = tenant.estimated_tier3_call_cost;
        if !ledger.can_afford(estimated_cost) {
            self.black_box.log_event(BlackBoxEvent::BudgetExceeded, &tenant.tenant_id, "tier3 budget gate").await;
            return None;
        }

        let prompt = build_routing_prompt(scenarios, query);
        let request = LlmRequest { system_prompt: prompt, user_message: query.to_string(), json_mode: true };
        let started = Instant::now();
        let response = match self.llm.generate(LlmRole::FallbackLlm, request).await {
            Ok(response) => response,
            Err(_) => {
                self.black_box.log_event(BlackBoxEvent::RoutingError, &tenant.tenant_id, "fallback llm unavailable").await;
                return None;
            }
        };
        let _elapsed = started.elapsed();

        let parsed: Tier3Reply = match serde_json::from_str(&response.text) {
            Ok(parsed) => parsed,
            Err(_) => {
                self.black_box.log_event(BlackBoxEvent::RoutingError, &tenant.tenant_id, "tier3 response not valid json").await;
                return None;
            }
        };

        let scenario_id = parsed.scenario_id?;
        if !scenarios.iter().any(|s| s.scenario_id == scenario_id && s.is_matchable()) {
            self.black_box.log_event(BlackBoxEvent::RoutingError, &tenant.tenant_id, "tier3 scenario not found").await;
            return None;
        }
        let confidence = parsed.confidence.unwrap_or(0.5).clamp(0.0, 1.0);

        let cost = self.llm.estimate_cost(&response);
        let new_spend = ledger.increment_spend(cost);
        if let Err(err) = self.documents.increment_spend(&tenant.tenant_id, cost).await {
            tracing::warn!(tenant_id = %tenant.tenant_id, error = %err, "failed to persist tier3 spend increment");
        }
        if new_spend / ledger.monthly_budget() >= 0.8 {
            self.black_box.log_event(BlackBoxEvent::BudgetWarning, &tenant.tenant_id, &format!("{new_spend:.2}/{:.2}", ledger.monthly_budget())).await;
        }
        self.black_box.log_event(BlackBoxEvent::Tier3LlmFallbackCalled, &tenant.tenant_id, &scenario_id).await;

        self.cache
            .put(cache_key.to_string(), format!("{scenario_id}\u{1}{confidence}"), TIER3_CACHE_TTL)
            .await;

        Some(RouteMatch { scenario_id, confidence, tier: Tier::Three, cost, cached: false })
    }
}

fn build_routing_prompt(scenarios: &[Scenario], query: &str) -> String {
    let mut lines = vec!["Pick the best matching scenario id for the caller's message. Respond as JSON {\"scenarioId\":..,\"confidence\":0-1}.".to_string()];
    lines.push("Active scenarios:".to_string());
    for scenario in scenarios.iter().filter(|s| s.is_matchable()) {
        lines.push(format!("- {} ({})", scenario.scenario_id, scenario.name));
    }
    lines.push(format!("Caller message: {query}"));
    lines.join("\n")
}
