//! ServiceTypeResolver (C3, §4.3)
//!
//! A keyword-bucket scorer over the same compiled-pattern idea as the
//! teacher's `IntentDetector::calculate_intent_score`
//! (`crates/agent/src/intent.rs`), generalized from example-utterance
//! overlap to three confidence-weighted keyword buckets per canonical
//! service type. Never throws: every branch returns an updated
//! `ServiceTypeResolution`, even on empty or unmatched input.

use std::collections::HashMap;

use recept_core::{ClarifierType, ConfidenceTier, ResolutionState, ServiceTypeResolution};
use unicode_segmentation::UnicodeSegmentation;

const HIGH_WEIGHT: i32 = 3;
const MEDIUM_WEIGHT: i32 = 2;
const LOW_WEIGHT: i32 = 1;

const HIGH_THRESHOLD: i32 = 4;
const TIE_MARGIN: i32 = 1;
const MEDIUM_THRESHOLD: i32 = 2;

struct KeywordBucket {
    canonical_type: &'static str,
    weight: i32,
    keywords: &'static [&'static str],
}

const BUCKETS: &[KeywordBucket] = &[
    KeywordBucket {
        canonical_type: "emergency",
        weight: HIGH_WEIGHT,
        keywords: &["emergency", "flooding", "flooded", "gas smell", "no heat", "right away", "urgent"],
    },
    KeywordBucket {
        canonical_type: "repair",
        weight: MEDIUM_WEIGHT,
        keywords: &["broken", "leak", "leaking", "not working", "stopped working", "fix", "repair"],
    },
    KeywordBucket {
        canonical_type: "maintenance",
        weight: LOW_WEIGHT,
        keywords: &["maintenance", "tune-up", "tune up", "checkup", "inspection", "annual service"],
    },
];

pub struct ServiceTypeResolver;

impl ServiceTypeResolver {
    /// Score `text` against the call's current resolution and return the
    /// next resolution state. §4.3 step order:
    /// 1. `Locked` short-circuits unconditionally.
    /// 2. A `Resolved`/`High` prior resolution short-circuits too, unless
    ///    the caller explicitly names a different canonical type.
    /// 3. An explicit type mention always confirms outright.
    /// 4. Empty input re-enters (or stays in) generic clarification.
    /// 5. Otherwise, bucket-score and classify.
    pub fn resolve(current: &ServiceTypeResolution, text: &str) -> ServiceTypeResolution {
        if current.is_locked() {
            return current.clone();
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return ServiceTypeResolution {
                state: ResolutionState::Clarifying,
                canonical_type: current.canonical_type.clone(),
                confidence: current.confidence,
                clarifier: Some(ClarifierType::Generic),
            };
        }

        if let Some(explicit) = Self::explicit_type_mention(trimmed) {
            return ServiceTypeResolution {
                state: ResolutionState::Confirmed,
                canonical_type: Some(explicit.to_string()),
                confidence: Some(ConfidenceTier::High),
                clarifier: None,
            };
        }

        if current.state == ResolutionState::Resolved && current.confidence == Some(ConfidenceTier::High) {
            return current.clone();
        }

        let scores = Self::score_buckets(trimmed);
        Self::classify(scores, current)
    }

    /// Interpret a caller's answer to a pending clarifying question
    /// (`current.state == Clarifying`) against the two types that
    /// question was choosing between, confirming via `apply_clarification`
    /// on a match. Falls back to a fresh `resolve` pass when the answer
    /// doesn't name either candidate — the caller may have changed the
    /// subject instead of answering.
    pub fn resolve_clarification(current: &ServiceTypeResolution, text: &str) -> ServiceTypeResolution {
        if current.is_locked() {
            return current.clone();
        }

        let lower = text.trim().to_lowercase();
        if let Some(clarifier) = current.clarifier {
            for candidate in clarifier.candidates() {
                if lower.contains(candidate) {
                    return Self::apply_clarification(current, candidate);
                }
            }
        }

        Self::resolve(current, text)
    }

    fn explicit_type_mention(text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        for bucket in BUCKETS {
            if lower == bucket.canonical_type || lower.contains(&format!("it's a {}", bucket.canonical_type)) {
                return Some(bucket.canonical_type);
            }
        }
        None
    }

    fn score_buckets(text: &str) -> HashMap<&'static str, i32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.unicode_words().collect();
        let mut scores: HashMap<&'static str, i32> = HashMap::new();

        for bucket in BUCKETS {
            for keyword in bucket.keywords {
                let hit = if keyword.contains(' ') {
                    lower.contains(keyword)
                } else {
                    words.contains(keyword)
                };
                if hit {
                    *scores.entry(bucket.canonical_type).or_insert(0) += bucket.weight;
                }
            }
        }
        scores
    }

    fn classify(scores: HashMap<&'static str, i32>, current: &ServiceTypeResolution) -> ServiceTypeResolution {
        let mut ranked: Vec<(&str, i32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let Some((top_type, top_score)) = ranked.first().copied() else {
            return ServiceTypeResolution {
                state: ResolutionState::Clarifying,
                canonical_type: current.canonical_type.clone(),
                confidence: current.confidence,
                clarifier: Some(ClarifierType::Generic),
            };
        };

        let runner_up_score = ranked.get(1).map(|(_, s)| *s).unwrap_or(0);
        let margin = top_score - runner_up_score;
        let is_tie = ranked.len() >= 2 && margin < TIE_MARGIN;

        if !is_tie && top_score >= HIGH_THRESHOLD {
            return ServiceTypeResolution {
                state: ResolutionState::Resolved,
                canonical_type: Some(top_type.to_string()),
                confidence: Some(ConfidenceTier::High),
                clarifier: None,
            };
        }

        if !is_tie && top_score >= MEDIUM_THRESHOLD {
            return ServiceTypeResolution {
                state: ResolutionState::Resolved,
                canonical_type: Some(top_type.to_string()),
                confidence: Some(ConfidenceTier::Medium),
                clarifier: None,
            };
        }

        let clarifier = if is_tie {
            match (ranked[0].0, ranked[1].0) {
                ("emergency", "repair") | ("repair", "emergency") => ClarifierType::EmergencyVsRegular,
                ("repair", "maintenance") | ("maintenance", "repair") => ClarifierType::RepairVsMaintenance,
                _ => ClarifierType::Generic,
            }
        } else {
            ClarifierType::Generic
        };

        ServiceTypeResolution {
            state: ResolutionState::Clarifying,
            // Tentative: the leading bucket so far, not yet confirmed.
            canonical_type: Some(top_type.to_string()),
            confidence: Some(ConfidenceTier::Low),
            clarifier: Some(clarifier),
        }
    }

    /// Apply a caller's answer to a prior clarifying question, resolving
    /// directly to `Confirmed` — the caller has now been asked explicitly.
    pub fn apply_clarification(current: &ServiceTypeResolution, canonical_type: &str) -> ServiceTypeResolution {
        if current.is_locked() {
            return current.clone();
        }
        ServiceTypeResolution {
            state: ResolutionState::Confirmed,
            canonical_type: Some(canonical_type.to_string()),
            confidence: Some(ConfidenceTier::High),
            clarifier: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> ServiceTypeResolution {
        ServiceTypeResolution::default()
    }

    #[test]
    fn locked_short_circuits() {
        let mut locked = pending();
        locked.lock();
        let next = ServiceTypeResolver::resolve(&locked, "it's an emergency, flooding everywhere");
        assert!(next.is_locked());
        assert_eq!(next.canonical_type, None);
    }

    #[test]
    fn explicit_type_confirms_immediately() {
        let next = ServiceTypeResolver::resolve(&pending(), "maintenance");
        assert_eq!(next.state, ResolutionState::Confirmed);
        assert_eq!(next.canonical_type.as_deref(), Some("maintenance"));
    }

    #[test]
    fn empty_text_enters_generic_clarification() {
        let next = ServiceTypeResolver::resolve(&pending(), "   ");
        assert_eq!(next.state, ResolutionState::Clarifying);
        assert_eq!(next.clarifier, Some(ClarifierType::Generic));
    }

    #[test]
    fn strong_emergency_language_resolves_high() {
        let next = ServiceTypeResolver::resolve(&pending(), "this is an emergency, water is flooding the basement right away");
        assert_eq!(next.state, ResolutionState::Resolved);
        assert_eq!(next.confidence, Some(ConfidenceTier::High));
        assert_eq!(next.canonical_type.as_deref(), Some("emergency"));
    }

    #[test]
    fn weak_ambiguous_signal_asks_to_clarify() {
        let next = ServiceTypeResolver::resolve(&pending(), "something about the heater");
        assert_eq!(next.state, ResolutionState::Clarifying);
    }

    #[test]
    fn high_confidence_resolution_short_circuits_further_turns() {
        let first = ServiceTypeResolver::resolve(&pending(), "emergency, flooding, right away");
        assert_eq!(first.confidence, Some(ConfidenceTier::High));
        let second = ServiceTypeResolver::resolve(&first, "what are your hours");
        assert_eq!(second.canonical_type, first.canonical_type);
        assert_eq!(second.state, ResolutionState::Resolved);
    }

    #[test]
    fn close_tie_carries_a_tentative_type() {
        let next = ServiceTypeResolver::resolve(
            &pending(),
            "my furnace is broken, I was also thinking about a tune-up and a checkup someday",
        );
        assert_eq!(next.state, ResolutionState::Clarifying);
        assert_eq!(next.clarifier, Some(ClarifierType::RepairVsMaintenance));
        assert!(next.canonical_type.is_some());
    }

    #[test]
    fn clarification_answer_confirms() {
        let clarifying = ServiceTypeResolver::resolve(&pending(), "something about the heater");
        let confirmed = ServiceTypeResolver::apply_clarification(&clarifying, "repair");
        assert_eq!(confirmed.state, ResolutionState::Confirmed);
        assert_eq!(confirmed.canonical_type.as_deref(), Some("repair"));
    }

    #[test]
    fn clarification_reentry_matches_candidate_instead_of_rescoring() {
        let clarifying = ServiceTypeResolver::resolve(
            &pending(),
            "my furnace is broken, I was also thinking about a tune-up and a checkup someday",
        );
        assert_eq!(clarifying.clarifier, Some(ClarifierType::RepairVsMaintenance));

        let confirmed = ServiceTypeResolver::resolve_clarification(&clarifying, "it's the maintenance one");
        assert_eq!(confirmed.state, ResolutionState::Confirmed);
        assert_eq!(confirmed.canonical_type.as_deref(), Some("maintenance"));
    }

    #[test]
    fn clarification_reentry_falls_back_to_scoring_on_unrelated_answer() {
        let clarifying = ServiceTypeResolver::resolve(&pending(), "something about the heater");
        let next = ServiceTypeResolver::resolve_clarification(&clarifying, "what are your hours");
        assert_eq!(next.state, ResolutionState::Clarifying);
    }
}
