//! Tier-1 rule matching, response formatting, and the tiered escalation
//! that ties both to Tier-2 semantic matching and the Tier-3 LLM fallback.
//!
//! - `selector`: `HybridScenarioSelector` (C4)
//! - `response_engine`: `ResponseEngine` (C7)
//! - `tiered_router`: `TieredRouter` (C9)

pub mod response_engine;
pub mod selector;
pub mod tiered_router;

pub use response_engine::{Channel, FollowUp, ResponseContext, ResponseEngine, ResponseOutcome, StrategyUsed};
pub use selector::{normalize, HybridScenarioSelector, MatchContext, ScoreBreakdown, SelectorMatch};
pub use tiered_router::{RouteMatch, Tier, TieredRouter};
