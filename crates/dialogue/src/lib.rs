//! Dialogue turn processing.
//!
//! - Slot extraction over a caller utterance (C2)
//! - Service type resolution with clarifying questions (C3)
//! - The turn orchestration loop that ties shortcut responders, triage
//!   context, and the dialogue LLM together (C10)

pub mod resolver;
pub mod slot_extractor;
pub mod turn_processor;

pub use resolver::ServiceTypeResolver;
pub use slot_extractor::SlotExtractor;
pub use turn_processor::{DialogueTurnProcessor, TurnMode, TurnOutcome, TurnSignals, TurnSource};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialogueError {
    #[error("llm gateway error: {0}")]
    Llm(#[from] recept_core::CoreError),
}
