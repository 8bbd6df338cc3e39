//! HybridScenarioSelector (C4, §4.4) — the Tier-1 rule-based matcher.
//!
//! Grounded on the same keyword-bucket idiom as `recept_dialogue`'s
//! `ServiceTypeResolver`: static weighted evidence summed per candidate,
//! then ranked. Here the candidates are scenarios rather than canonical
//! service types, and evidence comes from four independent dimensions
//! (keyword coverage, regex, context, negative triggers) instead of one.

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use recept_core::Scenario;

/// Per-call context the Tier-1 scorer can use for bonus evidence, beyond
/// the bare utterance text (§4.4).
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    pub channel: Option<String>,
    pub language: Option<String>,
    pub recent_scenario_ids: Vec<String>,
    pub last_intent: Option<String>,
}

/// Per-scenario evidence breakdown, returned alongside the winning match so
/// callers can explain a routing decision.
#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub keyword_score: f32,
    pub regex_score: f32,
    pub context_score: f32,
    pub negative_penalty: f32,
    pub evidence_types: u8,
}

#[derive(Debug, Clone)]
pub struct SelectorMatch {
    pub scenario_id: String,
    pub confidence: f32,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

/// Lowercase, trim, and collapse whitespace. Tenant-configured filler-word
/// stripping is not part of the current tenant schema; this is the
/// normalization §4.4 step 1 still guarantees.
pub fn normalize(utterance: &str) -> String {
    utterance.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

const KEYWORD_WEIGHT: f32 = 1.0;
const ALL_MUST_HAVE_MULTIPLIER: f32 = 1.5;
const REGEX_WEIGHT: f32 = 1.0;
const CONTEXT_CHANNEL_BONUS: f32 = 0.3;
const CONTEXT_LANGUAGE_BONUS: f32 = 0.2;
const CONTEXT_RECENT_BONUS: f32 = 0.4;

pub struct HybridScenarioSelector;

impl HybridScenarioSelector {
    /// Score every enabled scenario and return the best candidate, if any
    /// cleared a nonzero score. Tier threshold gating happens in
    /// `TieredRouter`, not here — this returns the best candidate
    /// regardless of confidence.
    pub fn select(utterance: &str, scenarios: &[Scenario], context: &MatchContext) -> Option<SelectorMatch> {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return None;
        }
        let words: Vec<&str> = normalized.unicode_words().collect();

        let mut candidates: Vec<SelectorMatch> = scenarios
            .iter()
            .filter(|s| s.is_matchable())
            .filter_map(|s| Self::score_scenario(s, &normalized, &words, context))
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.breakdown.evidence_types.cmp(&a.breakdown.evidence_types))
        });

        candidates.into_iter().next()
    }

    fn score_scenario(scenario: &Scenario, normalized: &str, words: &[&str], context: &MatchContext) -> Option<SelectorMatch> {
        let rules = &scenario.match_rules;

        if rules.keywords_exclude.iter().any(|k| normalized.contains(&k.to_lowercase())) {
            return None;
        }

        let mut breakdown = ScoreBreakdown::default();

        if !rules.keywords_must_have.is_empty() {
            let hits = rules
                .keywords_must_have
                .iter()
                .filter(|k| contains_keyword(normalized, words, &k.to_lowercase()))
                .count();
            let coverage = hits as f32 / rules.keywords_must_have.len() as f32;
            breakdown.keyword_score = coverage * KEYWORD_WEIGHT;
            if hits == rules.keywords_must_have.len() {
                breakdown.keyword_score *= ALL_MUST_HAVE_MULTIPLIER;
                breakdown.evidence_types += 1;
            } else if hits > 0 {
                breakdown.evidence_types += 1;
            }
        }

        for pattern in &rules.regex_patterns {
            if let Ok(compiled) = Regex::new(&format!("(?i){pattern}")) {
                if compiled.is_match(normalized) {
                    breakdown.regex_score += REGEX_WEIGHT;
                    breakdown.evidence_types += 1;
                }
            }
        }

        for hint in &rules.context_hints {
            let hint_lower = hint.to_lowercase();
            if context.channel.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(&hint_lower)) {
                breakdown.context_score += CONTEXT_CHANNEL_BONUS;
                breakdown.evidence_types += 1;
            }
            if context.language.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(&hint_lower)) {
                breakdown.context_score += CONTEXT_LANGUAGE_BONUS;
                breakdown.evidence_types += 1;
            }
        }
        if context.recent_scenario_ids.contains(&scenario.scenario_id) {
            breakdown.context_score += CONTEXT_RECENT_BONUS;
        }
        if context.last_intent.as_deref() == Some(scenario.scenario_id.as_str()) {
            breakdown.context_score += CONTEXT_RECENT_BONUS;
        }

        let raw_score = breakdown.keyword_score + breakdown.regex_score + breakdown.context_score;
        if raw_score <= 0.0 {
            return None;
        }

        // Priority breaks ties among equally-scored scenarios (§4.4 step 3).
        let score = raw_score + (scenario.match_rules.priority as f32 * 0.001);

        // Confidence is a calibrated function of raw score and the number
        // of distinct evidence types that contributed to it (§4.4 step 4).
        let confidence = (raw_score / (raw_score + 1.0)) * (1.0 + 0.1 * breakdown.evidence_types as f32).min(2.0);
        let confidence = confidence.clamp(0.0, 1.0);

        Some(SelectorMatch { scenario_id: scenario.scenario_id.clone(), confidence, score, breakdown })
    }
}

fn contains_keyword(normalized: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') {
        normalized.contains(keyword)
    } else {
        words.contains(&keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recept_core::{FollowUpMode, MatchRules, ReplyStrategy, ScenarioType};

    fn scenario(id: &str, must_have: &[&str], exclude: &[&str], priority: i32) -> Scenario {
        Scenario {
            scenario_id: id.to_string(),
            name: id.to_string(),
            scenario_type: ScenarioType::Faq,
            reply_strategy: ReplyStrategy::Auto,
            quick_replies: Vec::new(),
            full_replies: Vec::new(),
            quick_replies_no_name: None,
            full_replies_no_name: None,
            match_rules: MatchRules {
                keywords_must_have: must_have.iter().map(|s| s.to_string()).collect(),
                keywords_exclude: exclude.iter().map(|s| s.to_string()).collect(),
                priority,
                ..Default::default()
            },
            follow_up_mode: FollowUpMode::None,
            follow_up_question_text: None,
            transfer_target: None,
            is_enabled_for_company: true,
        }
    }

    #[test]
    fn all_must_have_keywords_win_over_partial_match() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"], &[], 0), scenario("ac_noise", &["ac", "noise"], &[], 0)];
        let result = HybridScenarioSelector::select("my AC is leaking water everywhere", &scenarios, &MatchContext::default());
        assert_eq!(result.unwrap().scenario_id, "ac_leak");
    }

    #[test]
    fn excluded_keyword_disqualifies_scenario() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"], &["warranty"], 0)];
        let result = HybridScenarioSelector::select("my AC is leaking but still under warranty", &scenarios, &MatchContext::default());
        assert!(result.is_none());
    }

    #[test]
    fn disabled_scenario_is_never_matched() {
        let mut scenario = scenario("promo", &["discount"], &[], 0);
        scenario.is_enabled_for_company = false;
        let result = HybridScenarioSelector::select("any discount available", &[scenario], &MatchContext::default());
        assert!(result.is_none());
    }

    #[test]
    fn priority_breaks_ties() {
        let scenarios = vec![scenario("low", &["pricing"], &[], 0), scenario("high", &["pricing"], &[], 5)];
        let result = HybridScenarioSelector::select("what's your pricing", &scenarios, &MatchContext::default());
        assert_eq!(result.unwrap().scenario_id, "high");
    }

    #[test]
    fn no_evidence_returns_none() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"], &[], 0)];
        let result = HybridScenarioSelector::select("what time do you open", &scenarios, &MatchContext::default());
        assert!(result.is_none());
    }

    #[test]
    fn empty_utterance_returns_none() {
        let scenarios = vec![scenario("ac_leak", &["ac", "leak"], &[], 0)];
        let result = HybridScenarioSelector::select("   ", &scenarios, &MatchContext::default());
        assert!(result.is_none());
    }
}
