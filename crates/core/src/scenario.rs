//! Scenario data model (§3) shared by Tier-1/Tier-2 matching and the
//! response engine.

use serde::{Deserialize, Serialize};

/// Canonical scenario type. Legacy synonyms (`INFO_FAQ`, `ACTION_FLOW`,
/// `SYSTEM_ACK`) are normalized into these at load time per §9 — downstream
/// code never sees the legacy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    Faq,
    Booking,
    Emergency,
    Transfer,
    System,
    SmallTalk,
    Billing,
    Troubleshoot,
}

impl ScenarioType {
    /// Normalize a raw scenario-type string, accepting both the canonical
    /// names and the legacy synonyms called out in SPEC_FULL.md §9.
    pub fn normalize(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        Some(match upper.as_str() {
            "FAQ" | "INFO_FAQ" => ScenarioType::Faq,
            "BOOKING" | "ACTION_FLOW" => ScenarioType::Booking,
            "EMERGENCY" => ScenarioType::Emergency,
            "TRANSFER" => ScenarioType::Transfer,
            "SYSTEM" | "SYSTEM_ACK" => ScenarioType::System,
            "SMALL_TALK" => ScenarioType::SmallTalk,
            "BILLING" => ScenarioType::Billing,
            "TROUBLESHOOT" => ScenarioType::Troubleshoot,
            _ => return None,
        })
    }
}

/// Reply selection strategy (§3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyStrategy {
    Auto,
    FullOnly,
    QuickOnly,
    QuickThenFull,
    /// Reserved per the Open Questions in §9 — behaves as `Auto` with a
    /// surfaced warning until a canonical behavior is specified.
    LlmWrap,
    /// Reserved, see `LlmWrap`.
    LlmContext,
}

impl ReplyStrategy {
    /// Whether this strategy is a reserved placeholder that currently
    /// degrades to `Auto` (§9 Open Questions).
    pub fn is_reserved(self) -> bool {
        matches!(self, ReplyStrategy::LlmWrap | ReplyStrategy::LlmContext)
    }
}

/// Follow-up behavior attached to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowUpMode {
    None,
    AskQuestion,
    Transfer,
}

/// A single reply candidate. Replies are either a bare string (weight 1,
/// per the Open Questions resolution in §9) or `{text, weight}`. Modeled as
/// a tagged variant at load per the re-architecture note in §9 — invalid
/// shapes are refused rather than silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyItem {
    Plain(String),
    Weighted {
        text: String,
        #[serde(default)]
        weight: f32,
    },
}

impl ReplyItem {
    pub fn text(&self) -> &str {
        match self {
            ReplyItem::Plain(t) => t,
            ReplyItem::Weighted { text, .. } => text,
        }
    }

    /// Resolved weight, defaulting undefined/invalid weights to `1.0`
    /// (the uniform default chosen in §9's Open Questions).
    pub fn weight(&self) -> f32 {
        match self {
            ReplyItem::Plain(_) => 1.0,
            ReplyItem::Weighted { weight, .. } => {
                if *weight > 0.0 {
                    *weight
                } else {
                    1.0
                }
            }
        }
    }

    pub fn with_text(&self, new_text: String) -> Self {
        match self {
            ReplyItem::Plain(_) => ReplyItem::Plain(new_text),
            ReplyItem::Weighted { weight, .. } => ReplyItem::Weighted { text: new_text, weight: *weight },
        }
    }
}

/// Matching rules used by the Tier-1 hybrid selector (§4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRules {
    #[serde(default)]
    pub keywords_must_have: Vec<String>,
    #[serde(default)]
    pub keywords_exclude: Vec<String>,
    #[serde(default)]
    pub regex_patterns: Vec<String>,
    #[serde(default)]
    pub context_hints: Vec<String>,
    #[serde(default)]
    pub negative_triggers: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub priority: i32,
}

fn default_weight() -> f32 {
    1.0
}

/// A tenant-assignable scenario (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub scenario_id: String,
    pub name: String,
    pub scenario_type: ScenarioType,
    pub reply_strategy: ReplyStrategy,
    #[serde(default)]
    pub quick_replies: Vec<ReplyItem>,
    #[serde(default)]
    pub full_replies: Vec<ReplyItem>,
    #[serde(default)]
    pub quick_replies_no_name: Option<Vec<ReplyItem>>,
    #[serde(default)]
    pub full_replies_no_name: Option<Vec<ReplyItem>>,
    #[serde(default)]
    pub match_rules: MatchRules,
    #[serde(default)]
    pub follow_up_mode: FollowUpMode,
    #[serde(default)]
    pub follow_up_question_text: Option<String>,
    #[serde(default)]
    pub transfer_target: Option<String>,
    #[serde(default = "default_true")]
    pub is_enabled_for_company: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FollowUpMode {
    fn default() -> Self {
        FollowUpMode::None
    }
}

impl Scenario {
    /// Invariant from §3: scenario matching only ever considers scenarios
    /// with `isEnabledForCompany != false`.
    pub fn is_matchable(&self) -> bool {
        self.is_enabled_for_company
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_synonyms() {
        assert_eq!(ScenarioType::normalize("INFO_FAQ"), Some(ScenarioType::Faq));
        assert_eq!(ScenarioType::normalize("ACTION_FLOW"), Some(ScenarioType::Booking));
        assert_eq!(ScenarioType::normalize("SYSTEM_ACK"), Some(ScenarioType::System));
        assert_eq!(ScenarioType::normalize("faq"), Some(ScenarioType::Faq));
        assert_eq!(ScenarioType::normalize("bogus"), None);
    }

    #[test]
    fn reply_item_default_weight_is_one() {
        let plain = ReplyItem::Plain("hi".into());
        assert_eq!(plain.weight(), 1.0);

        let weighted: ReplyItem = serde_json::from_str(r#"{"text":"hi"}"#).unwrap_or(ReplyItem::Weighted {
            text: "hi".into(),
            weight: 0.0,
        });
        assert_eq!(weighted.weight(), 1.0);
    }

    #[test]
    fn reserved_strategies_flagged() {
        assert!(ReplyStrategy::LlmWrap.is_reserved());
        assert!(!ReplyStrategy::Auto.is_reserved());
    }
}
