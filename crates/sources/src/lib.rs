//! Tenant knowledge sources and the priority router that walks them (C8).

pub mod knowledge_base;
pub mod priority_router;

pub use knowledge_base::{blended_confidence, resolve_fallback, EntryPool};
pub use priority_router::{KnowledgeBase, KnowledgeRouteResult, PriorityKnowledgeRouter, RoutingFlowEntry};
pub use recept_core::{FallbackCategory, InHouseFallback, KnowledgeEntry, PrioritySourceConfig, SourceKind};
