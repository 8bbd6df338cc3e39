//! The public `query()` composition (§6, §4.10): for tenants with a
//! configured `priorityFlow`, walks the `PriorityKnowledgeRouter` (C8);
//! otherwise ties `TieredRouter` (C9) + `ResponseEngine` together as the
//! cheap, cacheable scenario-matching path. Either way, a miss falls
//! through to `DialogueTurnProcessor`.
//!
//! The dialogue turn processor already runs its own quick-answer and
//! service-area shortcuts before ever reaching its brain, so routing a
//! query through one of the two scenario routers first and only falling
//! back to the turn processor on a miss keeps both paths cheap without
//! duplicating either one's shortcut logic.

use std::collections::HashMap;
use std::time::Instant;

use recept_core::{CallState, PlaceholderResolver, ResolveOptions, SourceKind};
use recept_routing::{Channel, MatchContext, ResponseContext, ResponseEngine, StrategyUsed, Tier};
use recept_sources::{KnowledgeBase, PriorityKnowledgeRouter};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryContext {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpMetadata {
    pub mode: String,
    pub question_text: Option<String>,
    pub transfer_target: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub source: String,
    pub tier: Option<String>,
    pub scenario_id: Option<String>,
    pub scenario_name: Option<String>,
    pub reply_type: String,
    pub follow_up: FollowUpMetadata,
    pub response_time_ms: u64,
    pub cached: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub confidence: f32,
    pub response: Option<String>,
    pub metadata: QueryMetadata,
}

/// Runs one turn of a call: tiered routing first, the dialogue turn
/// processor on a tier miss. Returns the result alongside the call state
/// to persist (§10: call-state TTL sweep owns storage, this just mutates).
pub async fn query(
    state: &AppState,
    tenant: &recept_core::Tenant,
    call_state: CallState,
    utterance: &str,
    context: &QueryContext,
) -> (QueryResult, CallState) {
    let started = Instant::now();
    let trimmed = utterance.trim();

    if trimmed.is_empty() {
        return (no_match(started), call_state);
    }

    let match_context = MatchContext {
        channel: context.channel.clone(),
        language: context.language.clone(),
        recent_scenario_ids: Vec::new(),
        last_intent: None,
    };

    if tenant.uses_priority_router() {
        if let Some(result) = priority_route(tenant, context, trimmed, started) {
            return (result, call_state);
        }
    } else if let Some(route_match) = state.router.route(tenant, trimmed, &tenant.scenarios, &match_context).await {
        crate::metrics::record_tier_selection(tier_label(route_match.tier));

        if let Some(scenario) = tenant.scenarios.iter().find(|s| s.scenario_id == route_match.scenario_id) {
            let response_context = ResponseContext {
                caller_name: context.caller_name.clone(),
                company_name: context.company_name.clone(),
                technician_name: None,
                appointment_time: None,
            };
            let channel = parse_channel(context.channel.as_deref());
            let outcome = ResponseEngine::respond(scenario, channel, &response_context, &tenant.placeholder_values, &HashMap::new());

            let elapsed = started.elapsed().as_millis() as u64;
            crate::metrics::record_query("tiered_router", elapsed);

            let result = QueryResult {
                confidence: route_match.confidence,
                response: outcome.text,
                metadata: QueryMetadata {
                    source: "tiered_router".to_string(),
                    tier: Some(tier_label(route_match.tier).to_string()),
                    scenario_id: Some(scenario.scenario_id.clone()),
                    scenario_name: Some(scenario.name.clone()),
                    reply_type: strategy_label(outcome.strategy_used).to_string(),
                    follow_up: FollowUpMetadata {
                        mode: format!("{:?}", outcome.follow_up.mode),
                        question_text: outcome.follow_up.question_text,
                        transfer_target: outcome.follow_up.transfer_target,
                    },
                    response_time_ms: elapsed,
                    cached: Some(route_match.cached),
                },
            };
            return (result, call_state);
        }
    }

    let outcome = state.dialogue.process_turn(tenant, call_state, trimmed).await;
    let elapsed = started.elapsed().as_millis() as u64;
    crate::metrics::record_query("dialogue", elapsed);

    let result = QueryResult {
        confidence: 1.0,
        response: Some(outcome.reply),
        metadata: QueryMetadata {
            source: "dialogue".to_string(),
            tier: None,
            scenario_id: None,
            scenario_name: None,
            reply_type: format!("{:?}", outcome.mode).to_lowercase(),
            follow_up: FollowUpMetadata { mode: "none".to_string(), question_text: outcome.next_goal, transfer_target: None },
            response_time_ms: elapsed,
            cached: None,
        },
    };
    (result, outcome.updated_state)
}

/// §4.8/§6: walk the tenant's `priorityFlow` and produce a final
/// `QueryResult`, or `None` on a miss (every source skipped or below its
/// threshold) so the caller falls through to the dialogue turn
/// processor. `instantResponses`' "response" is a scenario id, not
/// rendered text — it still has to go through `ResponseEngine` for
/// reply-strategy selection and placeholder substitution; every other
/// source's "response" is already final text and only needs the
/// placeholder pass.
fn priority_route(tenant: &recept_core::Tenant, context: &QueryContext, query_text: &str, started: Instant) -> Option<QueryResult> {
    let knowledge = KnowledgeBase::from_tenant(tenant);
    let route_result = PriorityKnowledgeRouter::route(&tenant.priority_flow, &tenant.scenarios, &knowledge, query_text);
    if !route_result.success {
        return None;
    }
    let source = route_result.source?;
    let raw_response = route_result.response?;

    let (text, scenario_id) = if source == SourceKind::InstantResponses {
        let scenario = tenant.scenarios.iter().find(|s| s.scenario_id == raw_response)?;
        let response_context = ResponseContext {
            caller_name: context.caller_name.clone(),
            company_name: context.company_name.clone(),
            technician_name: None,
            appointment_time: None,
        };
        let channel = parse_channel(context.channel.as_deref());
        let outcome = ResponseEngine::respond(scenario, channel, &response_context, &tenant.placeholder_values, &HashMap::new());
        (outcome.text?, Some(raw_response))
    } else {
        let known_slots = HashMap::new();
        let empty_metadata = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant.placeholder_values, &empty_metadata, &known_slots);
        (resolver.resolve(&raw_response, &ResolveOptions::default()).text, None)
    };

    let elapsed = started.elapsed().as_millis() as u64;
    crate::metrics::record_query("priority_router", elapsed);

    Some(QueryResult {
        confidence: route_result.confidence,
        response: Some(text),
        metadata: QueryMetadata {
            source: "priority_router".to_string(),
            tier: None,
            scenario_id,
            scenario_name: None,
            reply_type: format!("{source:?}").to_lowercase(),
            follow_up: FollowUpMetadata { mode: "none".to_string(), question_text: None, transfer_target: None },
            response_time_ms: elapsed,
            cached: None,
        },
    })
}

fn tier_label(tier: Tier) -> &'static str {
    match tier {
        Tier::One => "tier1",
        Tier::Two => "tier2",
        Tier::Three => "tier3",
    }
}

fn strategy_label(strategy: StrategyUsed) -> &'static str {
    match strategy {
        StrategyUsed::Quick => "quick",
        StrategyUsed::Full => "full",
        StrategyUsed::QuickThenFull => "quick_then_full",
        StrategyUsed::ErrorNoReplies => "error_no_replies",
    }
}

fn parse_channel(raw: Option<&str>) -> Channel {
    match raw.map(|c| c.to_lowercase()) {
        Some(c) if c == "sms" => Channel::Sms,
        Some(c) if c == "chat" => Channel::Chat,
        _ => Channel::Voice,
    }
}

/// §7 InputInvalid: an empty or whitespace-only utterance is a deterministic
/// no-match, never a routing attempt.
fn no_match(started: Instant) -> QueryResult {
    QueryResult {
        confidence: 0.0,
        response: None,
        metadata: QueryMetadata {
            source: "none".to_string(),
            tier: None,
            scenario_id: None,
            scenario_name: None,
            reply_type: "none".to_string(),
            follow_up: FollowUpMetadata { mode: "none".to_string(), question_text: None, transfer_target: None },
            response_time_ms: started.elapsed().as_millis() as u64,
            cached: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_utterance_is_a_deterministic_no_match() {
        let result = no_match(Instant::now());
        assert_eq!(result.confidence, 0.0);
        assert!(result.response.is_none());
    }

    #[test]
    fn tier_labels_match_expected_strings() {
        assert_eq!(tier_label(Tier::One), "tier1");
        assert_eq!(tier_label(Tier::Two), "tier2");
        assert_eq!(tier_label(Tier::Three), "tier3");
    }

    #[test]
    fn channel_parsing_defaults_to_voice() {
        assert_eq!(parse_channel(None), Channel::Voice);
        assert_eq!(parse_channel(Some("SMS")), Channel::Sms);
        assert_eq!(parse_channel(Some("chat")), Channel::Chat);
        assert_eq!(parse_channel(Some("bogus")), Channel::Voice);
    }

    fn priority_tenant() -> recept_core::Tenant {
        recept_core::Tenant {
            tenant_id: "t1".into(),
            intelligence_mode: recept_core::IntelligenceMode::Global,
            scenarios: Vec::new(),
            triage_cards: Vec::new(),
            quick_answers: Vec::new(),
            tier_thresholds: Default::default(),
            source_thresholds: Default::default(),
            features: Default::default(),
            personality: Default::default(),
            placeholder_values: HashMap::new(),
            service_area: Vec::new(),
            monthly_llm_budget: 50.0,
            current_llm_spend: 0.0,
            estimated_tier3_call_cost: 0.5,
            priority_flow: vec![recept_core::PrioritySourceConfig {
                source: SourceKind::CompanyQna,
                priority: 0,
                threshold: 0.3,
                enabled: true,
            }],
            company_qna: vec![recept_core::KnowledgeEntry {
                id: "hours".into(),
                question: "what are your business hours".into(),
                answer: "We're open 8 to 6, {companyName}.".into(),
                category: None,
                ai_agent_role: None,
                enabled: true,
            }],
            trade_qna: Vec::new(),
            templates: Vec::new(),
            in_house_fallback: Default::default(),
        }
    }

    #[test]
    fn priority_route_resolves_placeholders_in_company_qna_answer() {
        let mut tenant = priority_tenant();
        tenant.placeholder_values.insert("companyName".to_string(), "Acme Plumbing".to_string());
        let context = QueryContext::default();
        let result = priority_route(&tenant, &context, "what are your business hours", Instant::now()).unwrap();
        assert_eq!(result.response.as_deref(), Some("We're open 8 to 6, Acme Plumbing."));
        assert_eq!(result.metadata.source, "priority_router");
    }

    #[test]
    fn priority_route_misses_when_no_source_clears_threshold() {
        let tenant = priority_tenant();
        let context = QueryContext::default();
        let result = priority_route(&tenant, &context, "completely unrelated gibberish query", Instant::now());
        assert!(result.is_none());
    }
}
