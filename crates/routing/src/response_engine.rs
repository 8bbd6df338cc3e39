//! ResponseEngine (C7, §4.7) — turns a matched scenario into final text.
//!
//! Grounded on `recept_core::PlaceholderResolver` for the substitution
//! pass and on the teacher's weighted-sampling idiom for picking among
//! several canned variants (`crates/llm/src/prompt.rs`'s persona
//! selection), generalized here into the full strategy decision matrix
//! and the Name-Safety seatbelt from §4.7.

use std::collections::HashMap;

use rand::Rng;
use recept_core::{FollowUpMode, PlaceholderResolver, ReplyItem, ReplyStrategy, ResolveOptions, Scenario, ScenarioType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Voice,
    Sms,
    Chat,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseContext {
    pub caller_name: Option<String>,
    pub company_name: Option<String>,
    pub technician_name: Option<String>,
    pub appointment_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyUsed {
    Quick,
    Full,
    QuickThenFull,
    ErrorNoReplies,
}

#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub text: Option<String>,
    pub strategy_used: StrategyUsed,
    pub scenario_type_resolved: ScenarioType,
    pub reply_strategy_resolved: ReplyStrategy,
    pub follow_up: FollowUp,
    pub has_caller_name: bool,
    /// Set when the Name-Safety seatbelt (§4.7) had to sanitize a `{name}`
    /// reference out of a reply that had no `_noName` variant.
    pub lazy_no_name_fallback_used: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FollowUp {
    pub mode: FollowUpMode,
    pub question_text: Option<String>,
    pub transfer_target: Option<String>,
}

pub struct ResponseEngine;

impl ResponseEngine {
    /// Produce the final outbound text for `scenario`, or `None` with
    /// `ErrorNoReplies` when the scenario has nothing to say (§4.7).
    pub fn respond(
        scenario: &Scenario,
        channel: Channel,
        context: &ResponseContext,
        tenant_values: &HashMap<String, String>,
        trade_fallbacks: &HashMap<String, String>,
    ) -> ResponseOutcome {
        let has_caller_name = context.caller_name.is_some();
        let strategy = if scenario.reply_strategy.is_reserved() {
            ReplyStrategy::Auto
        } else {
            scenario.reply_strategy
        };

        let (quick, full, lazy_fallback) = Self::select_arrays(scenario, has_caller_name);

        let (mut text, strategy_used) = match Self::resolve_strategy(scenario.scenario_type, strategy, channel, &quick, &full) {
            Some(pair) => pair,
            None => {
                return ResponseOutcome {
                    text: None,
                    strategy_used: StrategyUsed::ErrorNoReplies,
                    scenario_type_resolved: scenario.scenario_type,
                    reply_strategy_resolved: strategy,
                    follow_up: follow_up_of(scenario),
                    has_caller_name,
                    lazy_no_name_fallback_used: lazy_fallback,
                };
            }
        };

        let mut known_slots = HashMap::new();
        if let Some(name) = &context.caller_name {
            known_slots.insert("name".to_string(), name.clone());
        }
        if let Some(company) = &context.company_name {
            known_slots.insert("companyName".to_string(), company.clone());
        }
        if let Some(tech) = &context.technician_name {
            known_slots.insert("technician".to_string(), tech.clone());
        }
        if let Some(time) = &context.appointment_time {
            known_slots.insert("appointmentTime".to_string(), time.clone());
        }

        let resolver = PlaceholderResolver::new(tenant_values, trade_fallbacks, &known_slots);
        let resolved = resolver.resolve(&text, &ResolveOptions::default());
        text = resolved.text;

        ResponseOutcome {
            text: Some(text),
            strategy_used,
            scenario_type_resolved: scenario.scenario_type,
            reply_strategy_resolved: strategy,
            follow_up: follow_up_of(scenario),
            has_caller_name,
            lazy_no_name_fallback_used: lazy_fallback || resolved.name_fallback_used,
        }
    }

    /// Name-Safety seatbelt (§4.7): choose `_noName` arrays when the caller
    /// name is unknown, or sanitize `{name}` out of the normal arrays as a
    /// last resort.
    fn select_arrays(scenario: &Scenario, has_caller_name: bool) -> (Vec<ReplyItem>, Vec<ReplyItem>, bool) {
        if has_caller_name {
            return (scenario.quick_replies.clone(), scenario.full_replies.clone(), false);
        }
        if let (Some(quick), Some(full)) = (&scenario.quick_replies_no_name, &scenario.full_replies_no_name) {
            return (quick.clone(), full.clone(), false);
        }
        if let Some(quick) = &scenario.quick_replies_no_name {
            return (quick.clone(), sanitize_all(&scenario.full_replies), contains_name(&scenario.full_replies));
        }
        if let Some(full) = &scenario.full_replies_no_name {
            return (sanitize_all(&scenario.quick_replies), full.clone(), contains_name(&scenario.quick_replies));
        }

        let any_name = contains_name(&scenario.quick_replies) || contains_name(&scenario.full_replies);
        if any_name {
            (sanitize_all(&scenario.quick_replies), sanitize_all(&scenario.full_replies), true)
        } else {
            (scenario.quick_replies.clone(), scenario.full_replies.clone(), false)
        }
    }

    /// Decision matrix from §4.7: which of quick/full to use (or both, in
    /// priority order), per scenario type and reply strategy.
    fn resolve_strategy(
        scenario_type: ScenarioType,
        strategy: ReplyStrategy,
        channel: Channel,
        quick: &[ReplyItem],
        full: &[ReplyItem],
    ) -> Option<(String, StrategyUsed)> {
        let prefer_full_first = matches!(
            scenario_type,
            ScenarioType::Faq | ScenarioType::Billing | ScenarioType::Troubleshoot
        ) || channel != Channel::Voice;

        match strategy {
            ReplyStrategy::FullOnly => sample(full).map(|t| (t, StrategyUsed::Full)).or_else(|| sample(quick).map(|t| (t, StrategyUsed::Quick))),
            ReplyStrategy::QuickOnly => sample(quick).map(|t| (t, StrategyUsed::Quick)).or_else(|| sample(full).map(|t| (t, StrategyUsed::Full))),
            ReplyStrategy::QuickThenFull => {
                let q = sample(quick);
                let f = sample(full);
                match (q, f) {
                    (Some(q), Some(f)) => Some((format!("{q} {f}"), StrategyUsed::QuickThenFull)),
                    (Some(q), None) => Some((q, StrategyUsed::Quick)),
                    (None, Some(f)) => Some((f, StrategyUsed::Full)),
                    (None, None) => None,
                }
            }
            ReplyStrategy::Auto | ReplyStrategy::LlmWrap | ReplyStrategy::LlmContext => match scenario_type {
                ScenarioType::Booking | ScenarioType::Emergency | ScenarioType::Transfer => {
                    let q = sample(quick);
                    let f = sample(full);
                    match (q, f) {
                        (Some(q), Some(f)) => Some((format!("{q} {f}"), StrategyUsed::QuickThenFull)),
                        (None, Some(f)) => Some((f, StrategyUsed::Full)),
                        (Some(q), None) => Some((q, StrategyUsed::Quick)),
                        (None, None) => None,
                    }
                }
                ScenarioType::System | ScenarioType::SmallTalk => {
                    sample(quick).map(|t| (t, StrategyUsed::Quick)).or_else(|| sample(full).map(|t| (t, StrategyUsed::Full)))
                }
                _ if prefer_full_first => {
                    sample(full).map(|t| (t, StrategyUsed::Full)).or_else(|| sample(quick).map(|t| (t, StrategyUsed::Quick)))
                }
                _ => sample(quick).map(|t| (t, StrategyUsed::Quick)).or_else(|| sample(full).map(|t| (t, StrategyUsed::Full))),
            },
        }
    }
}

fn follow_up_of(scenario: &Scenario) -> FollowUp {
    FollowUp {
        mode: scenario.follow_up_mode,
        question_text: scenario.follow_up_question_text.clone(),
        transfer_target: scenario.transfer_target.clone(),
    }
}

fn contains_name(items: &[ReplyItem]) -> bool {
    items.iter().any(|i| i.text().contains("{name}"))
}

fn sanitize_all(items: &[ReplyItem]) -> Vec<ReplyItem> {
    items
        .iter()
        .map(|item| {
            let stripped = item.text().replace("{name}", "");
            item.with_text(collapse(&stripped))
        })
        .collect()
}

fn collapse(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" ,", ",").replace(" .", ".").replace(" !", "!").replace(" ?", "?").trim().to_string()
}

/// Cumulative-weight sampling over `items`, per §4.7: `X ∈ [0, Σw)`,
/// uniform when all weights are absent (every `ReplyItem::weight()`
/// already defaults to `1.0`).
fn sample(items: &[ReplyItem]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let total_weight: f32 = items.iter().map(|i| i.weight()).sum();
    if total_weight <= 0.0 {
        return items.first().map(|i| i.text().to_string());
    }
    let pick = rand::thread_rng().gen_range(0.0..total_weight);
    let mut cumulative = 0.0;
    for item in items {
        cumulative += item.weight();
        if pick < cumulative {
            return Some(item.text().to_string());
        }
    }
    items.last().map(|i| i.text().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recept_core::MatchRules;

    fn base_scenario(scenario_type: ScenarioType, strategy: ReplyStrategy) -> Scenario {
        Scenario {
            scenario_id: "s1".to_string(),
            name: "s1".to_string(),
            scenario_type,
            reply_strategy: strategy,
            quick_replies: vec![ReplyItem::Plain("Quick reply.".to_string())],
            full_replies: vec![ReplyItem::Plain("Full reply with detail.".to_string())],
            quick_replies_no_name: None,
            full_replies_no_name: None,
            match_rules: MatchRules::default(),
            follow_up_mode: FollowUpMode::None,
            follow_up_question_text: None,
            transfer_target: None,
            is_enabled_for_company: true,
        }
    }

    #[test]
    fn faq_auto_prefers_full() {
        let scenario = base_scenario(ScenarioType::Faq, ReplyStrategy::Auto);
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &ResponseContext::default(), &HashMap::new(), &HashMap::new());
        assert_eq!(outcome.text.as_deref(), Some("Full reply with detail."));
        assert_eq!(outcome.strategy_used, StrategyUsed::Full);
    }

    #[test]
    fn booking_auto_combines_quick_and_full() {
        let scenario = base_scenario(ScenarioType::Booking, ReplyStrategy::Auto);
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &ResponseContext::default(), &HashMap::new(), &HashMap::new());
        assert_eq!(outcome.text.as_deref(), Some("Quick reply. Full reply with detail."));
        assert_eq!(outcome.strategy_used, StrategyUsed::QuickThenFull);
    }

    #[test]
    fn no_replies_reports_error() {
        let mut scenario = base_scenario(ScenarioType::Faq, ReplyStrategy::FullOnly);
        scenario.quick_replies.clear();
        scenario.full_replies.clear();
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &ResponseContext::default(), &HashMap::new(), &HashMap::new());
        assert!(outcome.text.is_none());
        assert_eq!(outcome.strategy_used, StrategyUsed::ErrorNoReplies);
    }

    #[test]
    fn name_safety_strips_placeholder_without_leaking_braces() {
        let mut scenario = base_scenario(ScenarioType::Faq, ReplyStrategy::FullOnly);
        scenario.full_replies = vec![ReplyItem::Plain("Thanks, {name}! Let me help you schedule.".to_string())];
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &ResponseContext::default(), &HashMap::new(), &HashMap::new());
        let text = outcome.text.unwrap();
        assert!(!text.contains('{'));
        assert!(!text.starts_with(','));
        assert!(outcome.lazy_no_name_fallback_used);
    }

    #[test]
    fn known_name_uses_normal_array() {
        let mut scenario = base_scenario(ScenarioType::Faq, ReplyStrategy::FullOnly);
        scenario.full_replies = vec![ReplyItem::Plain("Thanks, {name}!".to_string())];
        let context = ResponseContext { caller_name: Some("Alice".to_string()), ..Default::default() };
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &context, &HashMap::new(), &HashMap::new());
        assert_eq!(outcome.text.as_deref(), Some("Thanks, Alice!"));
        assert!(!outcome.lazy_no_name_fallback_used);
    }

    #[test]
    fn reserved_strategy_degrades_to_auto() {
        let scenario = base_scenario(ScenarioType::Faq, ReplyStrategy::LlmWrap);
        let outcome = ResponseEngine::respond(&scenario, Channel::Voice, &ResponseContext::default(), &HashMap::new(), &HashMap::new());
        assert_eq!(outcome.reply_strategy_resolved, ReplyStrategy::Auto);
    }
}
