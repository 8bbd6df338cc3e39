//! SemanticMatcher (C5, §4.5) — Tier-2 fallback when the Tier-1 rule-based
//! selector doesn't clear its confidence threshold.

use recept_core::Scenario;

use crate::tfidf::TfidfIndex;

/// Build the text a scenario contributes to the TF-IDF corpus: its name
/// plus every keyword/context hint in its match rules, so a semantically
/// close utterance can match even without triggering the Tier-1 keyword
/// rules exactly.
fn scenario_document(scenario: &Scenario) -> String {
    let mut parts = vec![scenario.name.clone()];
    parts.extend(scenario.match_rules.keywords_must_have.iter().cloned());
    parts.extend(scenario.match_rules.context_hints.iter().cloned());
    parts.join(" ")
}

pub struct SemanticMatcher {
    index: TfidfIndex,
}

#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub scenario_id: String,
    pub confidence: f32,
}

impl SemanticMatcher {
    pub fn build(scenarios: &[Scenario]) -> Self {
        let documents: Vec<(String, String)> = scenarios
            .iter()
            .filter(|s| s.is_matchable())
            .map(|s| (s.scenario_id.clone(), scenario_document(s)))
            .collect();
        let index = TfidfIndex::build(documents.iter().map(|(id, doc)| (id.clone(), doc.as_str())));
        Self { index }
    }

    /// Best scenario match at or above `min_confidence`, per the Tier-2
    /// threshold gate in §4.9.
    pub fn best_match(&self, utterance: &str, min_confidence: f32) -> Option<SemanticMatch> {
        self.index
            .best_match(utterance, min_confidence)
            .map(|(scenario_id, confidence)| SemanticMatch { scenario_id, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recept_core::{FollowUpMode, MatchRules, ReplyStrategy, ScenarioType};

    fn scenario(id: &str, name: &str, keywords: &[&str]) -> Scenario {
        Scenario {
            scenario_id: id.to_string(),
            name: name.to_string(),
            scenario_type: ScenarioType::Faq,
            reply_strategy: ReplyStrategy::Auto,
            quick_replies: Vec::new(),
            full_replies: Vec::new(),
            quick_replies_no_name: None,
            full_replies_no_name: None,
            match_rules: MatchRules {
                keywords_must_have: keywords.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            follow_up_mode: FollowUpMode::None,
            follow_up_question_text: None,
            transfer_target: None,
            is_enabled_for_company: true,
        }
    }

    #[test]
    fn matches_semantically_close_utterance() {
        let scenarios = vec![
            scenario("hours", "business hours", &["hours", "open", "close"]),
            scenario("pricing", "pricing", &["cost", "price", "quote"]),
        ];
        let matcher = SemanticMatcher::build(&scenarios);
        let result = matcher.best_match("what time do you close today", 0.1);
        assert_eq!(result.unwrap().scenario_id, "hours");
    }

    #[test]
    fn disabled_scenarios_are_excluded() {
        let mut disabled = scenario("promo", "promo", &["discount", "promo"]);
        disabled.is_enabled_for_company = false;
        let matcher = SemanticMatcher::build(&[disabled]);
        assert!(matcher.best_match("any discount available", 0.0).is_none());
    }
}
