//! PriorityKnowledgeRouter (C8, §4.8) — walks a tenant's ordered
//! `priorityFlow` of knowledge sources and returns the first that clears
//! its configured threshold.
//!
//! Grounded on the teacher's `HybridRetriever::search` staged pipeline
//! (`crates/rag/src/retriever.rs`): score each candidate pool, record
//! enough detail to explain the decision, stop at the first acceptable
//! hit. Here the stages are tenant-configured sources walked in priority
//! order instead of a single fused dense/sparse search.

use std::collections::HashSet;
use std::time::Instant;

use recept_core::{InHouseFallback, PrioritySourceConfig, Scenario, SourceKind, Tenant};
use recept_knowledge::tokenize;
use recept_routing::{selector::normalize, HybridScenarioSelector, MatchContext};
use serde::{Deserialize, Serialize};

use crate::knowledge_base::{self, EntryPool};

/// One entry in the routing flow trace returned alongside the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingFlowEntry {
    pub source: SourceKind,
    pub skipped: bool,
    pub confidence: f32,
    pub latency_ms: u64,
    pub matched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeRouteResult {
    pub success: bool,
    pub response: Option<String>,
    pub confidence: f32,
    pub source: Option<SourceKind>,
    pub routing_flow: Vec<RoutingFlowEntry>,
    pub total_response_time_ms: u64,
}

/// The knowledge pools a tenant can route a query against, excluding
/// `instantResponses` (which delegates to the scenario pool passed
/// directly to `route`).
pub struct KnowledgeBase {
    pub company_qna: EntryPool,
    pub trade_qna: EntryPool,
    pub templates: EntryPool,
    pub in_house_fallback: InHouseFallback,
}

impl KnowledgeBase {
    /// Build the pooled/indexed knowledge base from a tenant's raw
    /// `companyQnA`/`tradeQnA`/`templates`/`inHouseFallback` records
    /// (§4.8). Indexing happens once per tenant load, not per query.
    pub fn from_tenant(tenant: &Tenant) -> Self {
        Self {
            company_qna: EntryPool::build(tenant.company_qna.clone()),
            trade_qna: EntryPool::build(tenant.trade_qna.clone()),
            templates: EntryPool::build(tenant.templates.clone()),
            in_house_fallback: tenant.in_house_fallback.clone(),
        }
    }
}

pub struct PriorityKnowledgeRouter;

impl PriorityKnowledgeRouter {
    /// Walk `flow` in ascending priority order, applying the pre-filter,
    /// scoring, and threshold-gate steps of §4.8 to each enabled source.
    pub fn route(
        flow: &[PrioritySourceConfig],
        scenarios: &[Scenario],
        knowledge: &KnowledgeBase,
        query: &str,
    ) -> KnowledgeRouteResult {
        let started = Instant::now();
        let mut ordered: Vec<&PrioritySourceConfig> = flow.iter().filter(|s| s.enabled).collect();
        ordered.sort_by_key(|s| s.priority);

        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        let mut routing_flow = Vec::new();

        for config in ordered {
            let step_started = Instant::now();
            let outcome = Self::query_source(config.source, scenarios, knowledge, query, &query_tokens);

            let (skipped, confidence, response) = match outcome {
                None => (true, 0.0, None),
                Some((confidence, response)) => (false, confidence, response),
            };
            let latency_ms = step_started.elapsed().as_millis() as u64;
            let matched = !skipped && confidence >= config.threshold && response.is_some();

            routing_flow.push(RoutingFlowEntry {
                source: config.source,
                skipped,
                confidence,
                latency_ms,
                matched,
            });

            if matched {
                return KnowledgeRouteResult {
                    success: true,
                    response,
                    confidence,
                    source: Some(config.source),
                    routing_flow,
                    total_response_time_ms: started.elapsed().as_millis() as u64,
                };
            }
        }

        KnowledgeRouteResult {
            success: false,
            response: None,
            confidence: 0.0,
            source: None,
            routing_flow,
            total_response_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Pre-filter (§4.8 step 1) plus per-source scoring (step 2). Returns
    /// `None` on a pre-filter miss (recorded by the caller as `SKIP`).
    fn query_source(
        source: SourceKind,
        scenarios: &[Scenario],
        knowledge: &KnowledgeBase,
        query: &str,
        query_tokens: &HashSet<String>,
    ) -> Option<(f32, Option<String>)> {
        match source {
            SourceKind::InstantResponses => {
                let normalized = normalize(query);
                if normalized.is_empty() {
                    return None;
                }
                let best = HybridScenarioSelector::select(query, scenarios, &MatchContext::default())?;
                Some((best.confidence, Some(best.scenario_id)))
            }
            SourceKind::CompanyQna => {
                if !knowledge.company_qna.overlaps(query_tokens) {
                    return None;
                }
                let (entry, confidence) = knowledge.company_qna.best_match(query)?;
                Some((confidence, Some(entry.answer.clone())))
            }
            SourceKind::TradeQna => {
                if !knowledge.trade_qna.overlaps(query_tokens) {
                    return None;
                }
                let (entry, confidence) = knowledge.trade_qna.best_match(query)?;
                Some((confidence, Some(entry.answer.clone())))
            }
            SourceKind::Templates => {
                if !knowledge.templates.overlaps(query_tokens) {
                    return None;
                }
                let (entry, confidence) = knowledge.templates.best_match(query)?;
                Some((confidence, Some(entry.answer.clone())))
            }
            SourceKind::InHouseFallback => {
                let (response, confidence) = knowledge_base::resolve_fallback(&knowledge.in_house_fallback, query);
                Some((confidence, Some(response)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recept_core::{FollowUpMode, KnowledgeEntry, MatchRules, ReplyStrategy, ScenarioType};

    fn scenario(id: &str, keywords: &[&str]) -> Scenario {
        Scenario {
            scenario_id: id.to_string(),
            name: id.to_string(),
            scenario_type: ScenarioType::Faq,
            reply_strategy: ReplyStrategy::Auto,
            quick_replies: Vec::new(),
            full_replies: Vec::new(),
            quick_replies_no_name: None,
            full_replies_no_name: None,
            match_rules: MatchRules { keywords_must_have: keywords.iter().map(|s| s.to_string()).collect(), ..Default::default() },
            follow_up_mode: FollowUpMode::None,
            follow_up_question_text: None,
            transfer_target: None,
            is_enabled_for_company: true,
        }
    }

    fn entry(id: &str, question: &str, answer: &str) -> KnowledgeEntry {
        KnowledgeEntry { id: id.to_string(), question: question.to_string(), answer: answer.to_string(), category: None, ai_agent_role: None, enabled: true }
    }

    fn empty_fallback() -> InHouseFallback {
        InHouseFallback { ultimate_fallback: "Let me connect you with a team member.".to_string(), ..Default::default() }
    }

    fn flow() -> Vec<PrioritySourceConfig> {
        vec![
            PrioritySourceConfig { source: SourceKind::InstantResponses, priority: 0, threshold: 0.5, enabled: true },
            PrioritySourceConfig { source: SourceKind::CompanyQna, priority: 1, threshold: 0.4, enabled: true },
            PrioritySourceConfig { source: SourceKind::InHouseFallback, priority: 4, threshold: 0.0, enabled: true },
        ]
    }

    #[test]
    fn instant_responses_wins_when_it_clears_threshold() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"])];
        let knowledge = KnowledgeBase {
            company_qna: EntryPool::build(vec![entry("hours", "what are your hours", "We open at 8.")]),
            trade_qna: EntryPool::build(Vec::new()),
            templates: EntryPool::build(Vec::new()),
            in_house_fallback: empty_fallback(),
        };
        let result = PriorityKnowledgeRouter::route(&flow(), &scenarios, &knowledge, "my ac is leaking everywhere");
        assert!(result.success);
        assert_eq!(result.source, Some(SourceKind::InstantResponses));
    }

    #[test]
    fn falls_through_to_company_qna() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"])];
        let knowledge = KnowledgeBase {
            company_qna: EntryPool::build(vec![entry("hours", "what are your business hours", "We're open 8 to 6.")]),
            trade_qna: EntryPool::build(Vec::new()),
            templates: EntryPool::build(Vec::new()),
            in_house_fallback: empty_fallback(),
        };
        let result = PriorityKnowledgeRouter::route(&flow(), &scenarios, &knowledge, "what are your business hours");
        assert!(result.success);
        assert_eq!(result.source, Some(SourceKind::CompanyQna));
        assert_eq!(result.response.as_deref(), Some("We're open 8 to 6."));
    }

    #[test]
    fn in_house_fallback_never_misses() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"])];
        let knowledge = KnowledgeBase {
            company_qna: EntryPool::build(Vec::new()),
            trade_qna: EntryPool::build(Vec::new()),
            templates: EntryPool::build(Vec::new()),
            in_house_fallback: empty_fallback(),
        };
        let result = PriorityKnowledgeRouter::route(&flow(), &scenarios, &knowledge, "something totally unrelated");
        assert!(result.success);
        assert_eq!(result.source, Some(SourceKind::InHouseFallback));
        assert!(result.response.is_some());
    }

    #[test]
    fn disabled_source_is_never_consulted() {
        let mut f = flow();
        f[0].enabled = false;
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"])];
        let knowledge = KnowledgeBase {
            company_qna: EntryPool::build(Vec::new()),
            trade_qna: EntryPool::build(Vec::new()),
            templates: EntryPool::build(Vec::new()),
            in_house_fallback: empty_fallback(),
        };
        let result = PriorityKnowledgeRouter::route(&f, &scenarios, &knowledge, "my ac is leaking");
        assert_ne!(result.source, Some(SourceKind::InstantResponses));
    }

    #[test]
    fn knowledge_base_builds_from_tenant_records() {
        let mut tenant = recept_core::Tenant {
            tenant_id: "t1".into(),
            intelligence_mode: recept_core::IntelligenceMode::Global,
            scenarios: Vec::new(),
            triage_cards: Vec::new(),
            quick_answers: Vec::new(),
            tier_thresholds: Default::default(),
            source_thresholds: Default::default(),
            features: Default::default(),
            personality: Default::default(),
            placeholder_values: Default::default(),
            service_area: Vec::new(),
            monthly_llm_budget: 50.0,
            current_llm_spend: 0.0,
            estimated_tier3_call_cost: 0.5,
            priority_flow: Vec::new(),
            company_qna: Vec::new(),
            trade_qna: Vec::new(),
            templates: Vec::new(),
            in_house_fallback: InHouseFallback::default(),
        };
        tenant.company_qna = vec![entry("hours", "what are your business hours", "8 to 6")];
        let knowledge = KnowledgeBase::from_tenant(&tenant);
        let tokens: HashSet<String> = tokenize("what are your business hours").into_iter().collect();
        assert!(knowledge.company_qna.overlaps(&tokens));
    }
}
