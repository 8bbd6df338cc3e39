//! Typed slot storage and merge semantics (C2)
//!
//! Slot extraction itself (regex pattern compilation, normalization) lives
//! in `recept-dialogue`, grounded on the teacher's `IntentDetector` slot
//! patterns. This module only owns the shared data shapes so that
//! `recept-core::CallState` can hold slots without depending on the
//! extraction crate.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Canonical slot names the system tracks across a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Name,
    Phone,
    Address,
    Time,
    ServiceType,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotName::Name => "name",
            SlotName::Phone => "phone",
            SlotName::Address => "address",
            SlotName::Time => "time",
            SlotName::ServiceType => "serviceType",
        }
    }

    pub fn required_booking_slots() -> [SlotName; 4] {
        [SlotName::Name, SlotName::Phone, SlotName::Address, SlotName::Time]
    }
}

/// A single extracted slot value with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotValue {
    pub value: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// Which pattern/source produced this value, for tracing.
    pub pattern_source: String,
}

impl SlotValue {
    pub fn new(value: impl Into<String>, confidence: f32, pattern_source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            confidence: confidence.clamp(0.0, 1.0),
            pattern_source: pattern_source.into(),
        }
    }
}

/// A collection of known slots for a call.
pub type SlotMap = HashMap<SlotName, SlotValue>;

/// Merge newly-extracted slots into an existing slot map.
///
/// Per §4.2: existing confirmed slots are kept unless the new value has
/// strictly higher confidence. Returns the number of slots that were
/// actually updated (the `turnProvidedSlots` counter in the spec).
pub fn merge_slots(existing: &mut SlotMap, extracted: SlotMap) -> usize {
    let mut updated = 0;
    for (name, new_value) in extracted {
        let should_replace = match existing.get(&name) {
            Some(current) => new_value.confidence > current.confidence,
            None => true,
        };
        if should_replace {
            existing.insert(name, new_value);
            updated += 1;
        }
    }
    updated
}
