//! Shared data model, traits and error types for the tiered routing and
//! response engine.
//!
//! This crate holds the types every other crate in the workspace depends
//! on: the tenant configuration shape, per-call conversational state, the
//! scenario/triage/quick-answer data model, the budget ledger, and the
//! trait seams (`LlmGateway`, `DocumentStore`, `CacheLayer`, `TraceLogger`,
//! `BlackBoxLogger`) that let the routing, dialogue and server crates stay
//! decoupled from any one backend.

pub mod budget;
pub mod cache;
pub mod call_state;
pub mod error;
pub mod gateway;
pub mod knowledge_source;
pub mod placeholder;
pub mod quick_answer;
pub mod resolution;
pub mod scenario;
pub mod slot;
pub mod tenant;
pub mod triage;

pub use budget::BudgetLedger;
pub use cache::{cache_key, CacheLayer, InMemoryCache, NoopCache};
pub use call_state::{CallState, Consent, Lane, Phase, Turn, TurnRole, MAX_HISTORY_TURNS};
pub use error::{CoreError, Result};
pub use gateway::{
    BlackBoxEvent, BlackBoxLogger, DocumentStore, LlmGateway, LlmRequest, LlmResponse, LlmRole, TraceLogger,
    TurnTrace,
};
pub use knowledge_source::{FallbackCategory, InHouseFallback, KnowledgeEntry, PrioritySourceConfig, SourceKind};
pub use placeholder::{PlaceholderResolver, ResolveOptions, ResolvedText, NAME_KEY};
pub use quick_answer::QuickAnswer;
pub use resolution::{ClarifierType, ConfidenceTier, ResolutionState, ServiceTypeResolution};
pub use scenario::{FollowUpMode, MatchRules, ReplyItem, ReplyStrategy, Scenario, ScenarioType};
pub use slot::{merge_slots, SlotMap, SlotName, SlotValue};
pub use tenant::{FeatureSwitches, IntelligenceMode, Personality, SourceThresholds, Tenant, TierThresholds};
pub use triage::{TriageCard, Urgency};
