//! Knowledge-source data model for the `PriorityKnowledgeRouter` (C8,
//! §4.8): the ordered `priorityFlow` of sources and the raw
//! company/trade Q&A, template, and in-house-fallback records a tenant
//! carries. Scoring and pooling logic live in `recept_sources`; this
//! crate only owns the shape so `Tenant` can carry the config without a
//! cycle back into `recept_sources`.

use serde::{Deserialize, Serialize};

/// One queryable knowledge source `PriorityKnowledgeRouter` can walk
/// (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    InstantResponses,
    CompanyQna,
    TradeQna,
    Templates,
    InHouseFallback,
}

/// Per-source config inside a tenant's `priorityFlow` (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySourceConfig {
    pub source: SourceKind,
    pub priority: i32,
    pub threshold: f32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// One scoreable entry from `companyQnA`, `tradeQnA`, or `templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub ai_agent_role: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// One canned category inside `inHouseFallback` (§4.8): a keyword list and
/// the response to use when the query matches it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackCategory {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub response: String,
}

/// Trade-aware canned categories that guarantee a non-null response
/// (§4.8): `emergencySituations, serviceRequests, bookingRequests,
/// generalInquiries`, plus an ultimate fallback that never misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InHouseFallback {
    #[serde(default)]
    pub emergency_situations: FallbackCategory,
    #[serde(default)]
    pub service_requests: FallbackCategory,
    #[serde(default)]
    pub booking_requests: FallbackCategory,
    #[serde(default)]
    pub general_inquiries: FallbackCategory,
    #[serde(default = "default_ultimate_fallback")]
    pub ultimate_fallback: String,
}

fn default_ultimate_fallback() -> String {
    "Let me connect you with a team member who can help with that.".to_string()
}

impl Default for InHouseFallback {
    fn default() -> Self {
        Self {
            emergency_situations: FallbackCategory::default(),
            service_requests: FallbackCategory::default(),
            booking_requests: FallbackCategory::default(),
            general_inquiries: FallbackCategory::default(),
            ultimate_fallback: default_ultimate_fallback(),
        }
    }
}
