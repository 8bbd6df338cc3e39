//! Service type resolution state (C3 data model)
//!
//! The state machine's transition logic lives in `recept-dialogue`
//! (`ServiceTypeResolver`), grounded on the teacher's `IntentDetector`
//! scoring approach. This module owns the shared, monotonic state shape so
//! `CallState` can carry it without a crate cycle back into `recept-dialogue`.

use serde::{Deserialize, Serialize};

/// Resolution state. Transitions are monotonic: a state can only move
/// toward `Locked`, never backward, and once `Locked` it is never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Pending,
    Resolved,
    Clarifying,
    Confirmed,
    Locked,
}

impl ResolutionState {
    /// Rank used to enforce the monotonic ordering invariant.
    fn rank(self) -> u8 {
        match self {
            ResolutionState::Pending => 0,
            ResolutionState::Clarifying => 1,
            ResolutionState::Resolved => 2,
            ResolutionState::Confirmed => 3,
            ResolutionState::Locked => 4,
        }
    }

    /// Whether `self -> next` is an allowed (non-backward) transition.
    ///
    /// `Clarifying` is treated as lateral with `Resolved`/`Pending` since a
    /// resolver may re-enter clarification after a fresh low-information
    /// utterance; the only hard floor is `Locked`, which never transitions.
    pub fn can_transition_to(self, next: ResolutionState) -> bool {
        if self == ResolutionState::Locked {
            return next == ResolutionState::Locked;
        }
        next.rank() >= self.rank() || next == ResolutionState::Clarifying
    }
}

/// Confidence tier produced by the keyword-bucket scoring in §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

/// A clarifying question the resolver wants asked, keyed by which pair of
/// canonical types is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarifierType {
    EmergencyVsRegular,
    RepairVsMaintenance,
    Generic,
}

impl ClarifierType {
    pub fn question_text(self) -> &'static str {
        match self {
            ClarifierType::EmergencyVsRegular => {
                "Is this something that needs attention right away today, or can we schedule the next available appointment?"
            }
            ClarifierType::RepairVsMaintenance => {
                "Is this for a repair on something that's broken, or routine maintenance?"
            }
            ClarifierType::Generic => "Can you tell me a little more about what you need help with?",
        }
    }

    /// The canonical types this clarifier is choosing between, so a
    /// resolver can match the caller's answer against them directly
    /// instead of re-running first-contact scoring. `Generic` has none.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            ClarifierType::EmergencyVsRegular => &["emergency", "repair"],
            ClarifierType::RepairVsMaintenance => &["repair", "maintenance"],
            ClarifierType::Generic => &[],
        }
    }
}

/// Full resolution record carried on `CallState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeResolution {
    pub state: ResolutionState,
    /// Canonical type once known, e.g. "repair", "maintenance", "emergency".
    /// This is the sole authority per the Ownership invariant in §3 — legacy
    /// mirrored fields are written from this, never the reverse.
    pub canonical_type: Option<String>,
    pub confidence: Option<ConfidenceTier>,
    pub clarifier: Option<ClarifierType>,
}

impl Default for ServiceTypeResolution {
    fn default() -> Self {
        Self {
            state: ResolutionState::Pending,
            canonical_type: None,
            confidence: None,
            clarifier: None,
        }
    }
}

impl ServiceTypeResolution {
    /// Idempotent lock: once `Locked`, repeated calls are no-ops.
    pub fn lock(&mut self) {
        if self.state != ResolutionState::Locked {
            self.state = ResolutionState::Locked;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state == ResolutionState::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_never_moves() {
        let mut r = ServiceTypeResolution::default();
        r.canonical_type = Some("repair".into());
        r.lock();
        assert!(r.is_locked());
        // Calling lock again is a no-op.
        r.lock();
        assert_eq!(r.state, ResolutionState::Locked);
        assert!(!ResolutionState::Locked.can_transition_to(ResolutionState::Resolved));
    }

    #[test]
    fn forward_transitions_allowed() {
        assert!(ResolutionState::Pending.can_transition_to(ResolutionState::Resolved));
        assert!(ResolutionState::Resolved.can_transition_to(ResolutionState::Confirmed));
        assert!(ResolutionState::Confirmed.can_transition_to(ResolutionState::Locked));
    }
}
