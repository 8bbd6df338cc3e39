//! Tenant configuration shape (§3)
//!
//! `Tenant` is the per-call snapshot handed to every component: scenario
//! pool, thresholds, budget, personality and placeholder values. Schema and
//! loading live in `recept-config`; this crate only owns the shape so
//! `recept-core`'s algorithms (routing, resolution, placeholder resolution)
//! can depend on it without a cycle back into `recept-config`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::budget::BudgetLedger;
use crate::knowledge_source::{InHouseFallback, KnowledgeEntry, PrioritySourceConfig};
use crate::quick_answer::QuickAnswer;
use crate::scenario::Scenario;
use crate::triage::TriageCard;

/// Whether a tenant uses the shared global scenario/threshold pool or its
/// own custom configuration (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceMode {
    Global,
    Custom,
}

/// Per-tier confidence thresholds gating Tier-1 -> Tier-2 -> Tier-3
/// escalation (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierThresholds {
    #[serde(default = "default_tier1_threshold")]
    pub tier1_confidence: f32,
    #[serde(default = "default_tier2_threshold")]
    pub tier2_confidence: f32,
}

fn default_tier1_threshold() -> f32 {
    0.55
}

fn default_tier2_threshold() -> f32 {
    0.45
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            tier1_confidence: default_tier1_threshold(),
            tier2_confidence: default_tier2_threshold(),
        }
    }
}

/// Per-source confidence thresholds used by the `PriorityKnowledgeRouter`
/// (C8) when scoring companyQnA / tradeQnA / templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceThresholds {
    #[serde(default = "default_source_threshold")]
    pub company_qna: f32,
    #[serde(default = "default_source_threshold")]
    pub trade_qna: f32,
    #[serde(default = "default_source_threshold")]
    pub templates: f32,
    #[serde(default = "default_fallback_threshold")]
    pub in_house_fallback: f32,
}

fn default_source_threshold() -> f32 {
    0.5
}

fn default_fallback_threshold() -> f32 {
    0.3
}

impl Default for SourceThresholds {
    fn default() -> Self {
        Self {
            company_qna: default_source_threshold(),
            trade_qna: default_source_threshold(),
            templates: default_source_threshold(),
            in_house_fallback: default_fallback_threshold(),
        }
    }
}

/// Front-desk personality tuning used when assembling the dialogue prompt
/// (§4.10 step 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default)]
    pub tone_descriptors: Vec<String>,
    #[serde(default = "default_max_words")]
    pub max_response_words: u32,
    #[serde(default)]
    pub forbidden_phrases: Vec<String>,
}

fn default_persona_name() -> String {
    "Front Desk Assistant".to_string()
}

fn default_max_words() -> u32 {
    60
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            tone_descriptors: Vec::new(),
            max_response_words: default_max_words(),
            forbidden_phrases: Vec::new(),
        }
    }
}

/// Feature switches that gate optional behavior per tenant (§4.9, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSwitches {
    #[serde(default = "default_true")]
    pub enable_3_tier_intelligence: bool,
    #[serde(default = "default_true")]
    pub enable_llm_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureSwitches {
    fn default() -> Self {
        Self {
            enable_3_tier_intelligence: true,
            enable_llm_fallback: true,
        }
    }
}

/// Full per-tenant configuration snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: String,
    #[serde(default = "default_intelligence_mode")]
    pub intelligence_mode: IntelligenceMode,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub triage_cards: Vec<TriageCard>,
    #[serde(default)]
    pub quick_answers: Vec<QuickAnswer>,
    #[serde(default)]
    pub tier_thresholds: TierThresholds,
    #[serde(default)]
    pub source_thresholds: SourceThresholds,
    #[serde(default)]
    pub features: FeatureSwitches,
    #[serde(default)]
    pub personality: Personality,
    /// Raw placeholder values keyed by placeholder name (without braces),
    /// e.g. `"companyName" -> "Acme Plumbing"`. Resolved by the
    /// `PlaceholderResolver` (C1).
    #[serde(default)]
    pub placeholder_values: HashMap<String, String>,
    #[serde(default)]
    pub service_area: Vec<String>,
    #[serde(default = "default_monthly_budget")]
    pub monthly_llm_budget: f64,
    #[serde(default)]
    pub current_llm_spend: f64,
    #[serde(default = "default_tier3_cost")]
    pub estimated_tier3_call_cost: f64,
    /// Ordered knowledge-source flow for the `PriorityKnowledgeRouter`
    /// (C8, §4.8). Empty means this tenant uses the three-tier pipeline
    /// (C9) instead — §6's "depending on tenant config" choice between
    /// the two independent routers.
    #[serde(default)]
    pub priority_flow: Vec<PrioritySourceConfig>,
    #[serde(default)]
    pub company_qna: Vec<KnowledgeEntry>,
    #[serde(default)]
    pub trade_qna: Vec<KnowledgeEntry>,
    #[serde(default)]
    pub templates: Vec<KnowledgeEntry>,
    #[serde(default)]
    pub in_house_fallback: InHouseFallback,
}

fn default_intelligence_mode() -> IntelligenceMode {
    IntelligenceMode::Global
}

fn default_monthly_budget() -> f64 {
    50.0
}

fn default_tier3_cost() -> f64 {
    0.50
}

impl Tenant {
    /// Build a fresh `BudgetLedger` snapshot for this tenant. The ledger is
    /// rebuilt from the tenant record on each cache refresh (§3) — it is
    /// not the single source of truth across refreshes, the persisted
    /// `currentLlmSpend` is.
    pub fn budget_ledger(&self) -> BudgetLedger {
        BudgetLedger::new(self.monthly_llm_budget, self.current_llm_spend)
    }

    pub fn is_custom(&self) -> bool {
        self.intelligence_mode == IntelligenceMode::Custom
    }

    /// §6: a tenant with a configured `priorityFlow` routes through
    /// `PriorityKnowledgeRouter` (C8) instead of `TieredRouter` (C9).
    pub fn uses_priority_router(&self) -> bool {
        !self.priority_flow.is_empty()
    }

    /// Scenarios eligible for matching, per the enablement invariant in §3.
    pub fn matchable_scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|s| s.is_matchable())
    }

    pub fn active_triage_cards(&self) -> impl Iterator<Item = &TriageCard> {
        self.triage_cards.iter().filter(|c| c.active)
    }
}
