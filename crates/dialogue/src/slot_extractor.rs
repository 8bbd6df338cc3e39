//! SlotExtractor (C2, §4.2)
//!
//! Grounded on the teacher's `IntentDetector` (`crates/agent/src/intent.rs`):
//! the same shape of a `HashMap<slot name, Vec<CompiledSlotPattern>>` built
//! once at startup, tried in priority order, each pattern carrying its own
//! confidence. Extraction never fails the turn — a pattern miss just means
//! that slot stays unknown this turn (§4.2's non-fatal failure semantics);
//! callers that want to surface `S3_EXTRACTION_ERROR` do so by noticing an
//! empty result where they expected a hit, not via a propagated error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use recept_core::{SlotMap, SlotName, SlotValue};
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

struct CompiledSlotPattern {
    source: &'static str,
    regex: Regex,
    confidence: f32,
}

static NAME_PATTERNS: Lazy<Vec<CompiledSlotPattern>> = Lazy::new(|| {
    vec![
        CompiledSlotPattern {
            source: "my_name_is",
            regex: Regex::new(r"(?i)my name(?:'s| is)\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)").unwrap(),
            confidence: 0.95,
        },
        CompiledSlotPattern {
            source: "this_is_calling",
            regex: Regex::new(r"(?i)this is\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)\s+calling").unwrap(),
            confidence: 0.9,
        },
        CompiledSlotPattern {
            source: "it_is_name",
            regex: Regex::new(r"(?i)^(?:it's|it is|i'?m)\s+([A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?)$").unwrap(),
            confidence: 0.75,
        },
    ]
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\+?1[\s.-]?)?\(?(\d{3})\)?[\s.-]?(\d{3})[\s.-]?(\d{4})").unwrap());

static ADDRESS_PATTERNS: Lazy<Vec<CompiledSlotPattern>> = Lazy::new(|| {
    vec![
        CompiledSlotPattern {
            source: "i_live_at",
            regex: Regex::new(r"(?i)(?:i live at|my address is|i'?m at)\s+(\d+\s+[A-Za-z0-9'.,\s]+?)(?:[.!?]|$)").unwrap(),
            confidence: 0.9,
        },
        CompiledSlotPattern {
            source: "street_number",
            regex: Regex::new(r"(\d+\s+[A-Z][a-zA-Z]+\s+(?:St|Street|Ave|Avenue|Rd|Road|Blvd|Boulevard|Dr|Drive|Ln|Lane|Ct|Court)\b\.?)").unwrap(),
            confidence: 0.8,
        },
    ]
});

static TIME_PATTERNS: Lazy<Vec<CompiledSlotPattern>> = Lazy::new(|| {
    vec![
        CompiledSlotPattern {
            source: "relative_clock",
            regex: Regex::new(r"(?i)((?:today|tomorrow|tonight|this (?:morning|afternoon|evening)|next \w+)\s+(?:at\s+)?\d{1,2}(?::\d{2})?\s*(?:am|pm)?)").unwrap(),
            confidence: 0.9,
        },
        CompiledSlotPattern {
            source: "clock_time",
            regex: Regex::new(r"(?i)(\d{1,2}(?::\d{2})?\s*(?:am|pm))").unwrap(),
            confidence: 0.85,
        },
        CompiledSlotPattern {
            source: "relative_day",
            regex: Regex::new(r"(?i)\b(today|tomorrow|tonight|next \w+day)\b").unwrap(),
            confidence: 0.6,
        },
    ]
});

const REPAIR_KEYWORDS: &[&str] = &["broken", "leak", "leaking", "not working", "stopped working", "fix", "repair"];
const MAINTENANCE_KEYWORDS: &[&str] = &["maintenance", "tune-up", "tune up", "checkup", "inspection", "service call", "annual"];

fn extract_first(patterns: &[CompiledSlotPattern], text: &str, source: &str) -> Option<SlotValue> {
    for pattern in patterns {
        if let Some(captures) = pattern.regex.captures(text) {
            if let Some(matched) = captures.get(1) {
                return Some(SlotValue::new(matched.as_str().trim(), pattern.confidence, format!("{source}:{}", pattern.source)));
            }
        }
    }
    None
}

/// Extract `name`, `phone`, `address`, `time` and `serviceType` from a
/// single utterance. Always returns a (possibly empty) map — never panics,
/// never propagates an error.
pub struct SlotExtractor;

impl SlotExtractor {
    pub fn extract(text: &str) -> SlotMap {
        let mut slots = SlotMap::new();

        if let Some(value) = extract_first(&NAME_PATTERNS, text, "name") {
            slots.insert(SlotName::Name, value);
        }
        if let Some(value) = Self::extract_phone(text) {
            slots.insert(SlotName::Phone, value);
        }
        if let Some(value) = extract_first(&ADDRESS_PATTERNS, text, "address") {
            slots.insert(SlotName::Address, value);
        }
        if let Some(value) = extract_first(&TIME_PATTERNS, text, "time") {
            slots.insert(SlotName::Time, value);
        }
        if let Some(value) = Self::extract_service_type(text) {
            slots.insert(SlotName::ServiceType, value);
        }

        slots
    }

    /// Normalize to `NNN-NNN-NNNN`; reject matches with fewer than 10
    /// significant digits per §4.2.
    fn extract_phone(text: &str) -> Option<SlotValue> {
        let captures = PHONE_PATTERN.captures(text)?;
        let area = captures.get(2)?.as_str();
        let exchange = captures.get(3)?.as_str();
        let line = captures.get(4)?.as_str();
        let digit_count = area.len() + exchange.len() + line.len();
        if digit_count < 10 {
            return None;
        }
        Some(SlotValue::new(format!("{area}-{exchange}-{line}"), 0.95, "phone:nanp"))
    }

    fn extract_service_type(text: &str) -> Option<SlotValue> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.unicode_words().collect();
        let has_repair = REPAIR_KEYWORDS.iter().any(|k| contains_phrase(&lower, &words, k));
        let has_maintenance = MAINTENANCE_KEYWORDS.iter().any(|k| contains_phrase(&lower, &words, k));

        match (has_repair, has_maintenance) {
            (true, false) => Some(SlotValue::new("repair", 0.8, "serviceType:keyword")),
            (false, true) => Some(SlotValue::new("maintenance", 0.8, "serviceType:keyword")),
            (true, true) => Some(SlotValue::new("other", 0.5, "serviceType:ambiguous")),
            (false, false) => None,
        }
    }
}

fn contains_phrase(lower_text: &str, words: &[&str], phrase: &str) -> bool {
    if phrase.contains(' ') {
        lower_text.contains(phrase)
    } else {
        words.contains(&phrase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_name_from_my_name_is() {
        let slots = SlotExtractor::extract("Hi, my name is John Smith and I need help.");
        assert_eq!(slots[&SlotName::Name].value, "John Smith");
    }

    #[test]
    fn normalizes_phone_number() {
        let slots = SlotExtractor::extract("You can reach me at 555-123-4567.");
        assert_eq!(slots[&SlotName::Phone].value, "555-123-4567");
    }

    #[test]
    fn rejects_short_digit_sequences_as_phone() {
        let slots = SlotExtractor::extract("I've lived here for 12 345 days roughly.");
        assert!(!slots.contains_key(&SlotName::Phone));
    }

    #[test]
    fn extracts_relative_time() {
        let slots = SlotExtractor::extract("Can someone come tomorrow at 3pm?");
        assert!(slots.contains_key(&SlotName::Time));
    }

    #[test]
    fn classifies_repair_service_type() {
        let slots = SlotExtractor::extract("My heater is broken and leaking water everywhere.");
        assert_eq!(slots[&SlotName::ServiceType].value, "repair");
    }

    #[test]
    fn classifies_maintenance_service_type() {
        let slots = SlotExtractor::extract("I'd like to schedule annual maintenance for my furnace.");
        assert_eq!(slots[&SlotName::ServiceType].value, "maintenance");
    }

    #[test]
    fn unrelated_utterance_extracts_nothing() {
        let slots = SlotExtractor::extract("What are your hours today?");
        assert!(slots.is_empty());
    }
}
