//! Per-call conversational state (C10 data model)
//!
//! Grounded on the teacher's `Session` / `SessionManager` shape in
//! `server/session.rs`: an id, a creation timestamp, and mutable state that
//! a background sweep expires on a TTL. Unlike the teacher's session, all
//! the domain-specific turn/slot/resolution bookkeeping lives directly on
//! this struct since persistence of long-term profiles across calls is an
//! explicit non-goal — `CallState` is purely in-memory and call-scoped.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::resolution::ServiceTypeResolution;
use crate::slot::SlotMap;

/// Which role produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    Caller,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub turn_number: u32,
}

/// Coarse conversational phase. Never moves backward once `Booking` is
/// reached (§4.10 step 8's phase-monotonicity rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Booking,
    Confirmation,
}

/// Which knowledge lane is currently driving replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Routing,
    Dialogue,
    EmergencyFallback,
}

/// Caller-consent state for sensitive follow-ups (e.g. callback number
/// confirmation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Consent {
    #[serde(default)]
    pub pending: bool,
}

/// How many turns of raw conversation history are retained in memory.
/// Older turns are dropped; slots already extracted from them survive in
/// `known_slots` regardless.
pub const MAX_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallState {
    pub call_id: String,
    #[serde(default)]
    pub turn_count: u32,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub known_slots: SlotMap,
    #[serde(default = "default_phase")]
    pub phase: Phase,
    #[serde(default = "default_lane")]
    pub lane: Lane,
    #[serde(default)]
    pub consent: Consent,
    #[serde(default)]
    pub service_type_resolution: ServiceTypeResolution,
    /// Last assistant reply verbatim, used by the anti-repetition
    /// "YOU-JUST-SAID" prompt instruction (§4.10 step 7).
    #[serde(default)]
    pub last_assistant_reply: Option<String>,
    #[serde(skip, default = "Instant::now")]
    pub last_activity: Instant,
}

fn default_phase() -> Phase {
    Phase::Discovery
}

fn default_lane() -> Lane {
    Lane::Routing
}

impl CallState {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            turn_count: 0,
            history: Vec::new(),
            known_slots: SlotMap::new(),
            phase: Phase::Discovery,
            lane: Lane::Routing,
            consent: Consent::default(),
            service_type_resolution: ServiceTypeResolution::default(),
            last_assistant_reply: None,
            last_activity: Instant::now(),
        }
    }

    /// Append a turn, bump the turn counter, and cap history length.
    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        self.turn_count += 1;
        self.history.push(Turn {
            role,
            text: text.into(),
            turn_number: self.turn_count,
        });
        if self.history.len() > MAX_HISTORY_TURNS {
            let overflow = self.history.len() - MAX_HISTORY_TURNS;
            self.history.drain(0..overflow);
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.last_activity.elapsed() >= ttl
    }

    /// Advance the phase, refusing any move that would take it backward
    /// from `Booking` (§4.10 step 8).
    pub fn advance_phase(&mut self, next: Phase) {
        if self.phase == Phase::Booking && next == Phase::Discovery {
            return;
        }
        self.phase = next;
    }

    pub fn record_assistant_reply(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.push_turn(TurnRole::Assistant, text.clone());
        self.last_assistant_reply = Some(text);
    }
}
