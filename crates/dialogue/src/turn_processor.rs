//! DialogueTurnProcessor (C10, §4.10)
//!
//! Grounded on the teacher's `GoldLoanAgent::process` (`crates/agent/src/agent.rs`):
//! a single orchestration method that appends the caller turn, runs a
//! handful of shortcut responders before ever reaching the model, and
//! otherwise builds a prompt, calls the dialogue brain, and folds the
//! result back into the call's state. The shortcut responders and the
//! slot/resolution bookkeeping here replace the teacher's tool-calling and
//! RAG steps, which have no counterpart in this system.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use recept_core::{
    merge_slots, BlackBoxEvent, BlackBoxLogger, CallState, LlmGateway, LlmRequest, LlmRole, PlaceholderResolver, Phase,
    ResolutionState, SlotName, Tenant, TraceLogger, TriageCard, TurnRole, TurnTrace, Urgency,
};
use recept_llm::PromptBuilder;
use regex::Regex;
use serde::Deserialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::resolver::ServiceTypeResolver;
use crate::slot_extractor::SlotExtractor;

/// Where the final reply came from, for tracing and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSource {
    QuickAnswer,
    ServiceArea,
    Llm,
    EmergencyFallback,
}

/// Conversational mode inferred this turn (§4.10 step 9). Distinct from
/// `recept_core::Phase`: `Phase` is the monotonic booking funnel position,
/// `TurnMode` additionally covers the triage/rescue detours that don't
/// move the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMode {
    Discovery,
    Booking,
    Confirmation,
    Triage,
    Rescue,
}

#[derive(Debug, Clone, Default)]
pub struct TurnSignals {
    pub frustration: bool,
    pub wants_human: bool,
}

#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub updated_state: CallState,
    pub signals: TurnSignals,
    pub mode: TurnMode,
    pub next_goal: Option<String>,
    pub source: TurnSource,
}

/// Compact structured form the dialogue prompt asks for (§4.10 step 6).
#[derive(Debug, Deserialize, Default)]
struct CompactReply {
    reply: Option<String>,
    #[serde(default)]
    needs_info: Option<String>,
}

/// Richer structured form, also accepted per §4.10 step 6.
#[derive(Debug, Deserialize, Default)]
struct PhaseReply {
    reply: Option<String>,
    phase: Option<String>,
    #[serde(default)]
    wants_booking: bool,
    #[serde(default)]
    filled_slots: HashMap<String, String>,
    #[serde(default)]
    signals: PhaseSignals,
}

#[derive(Debug, Deserialize, Default)]
struct PhaseSignals {
    #[serde(default)]
    frustration: bool,
    #[serde(default)]
    wants_human: bool,
}

struct ParsedLlmReply {
    reply: String,
    needs_info: Option<String>,
    phase_hint: Option<Phase>,
    filled_slots: HashMap<String, String>,
    signals: TurnSignals,
}

static QUESTION_STARTERS: &[&str] = &["what", "how", "when", "where", "why", "do you", "can you", "is", "are", "could you"];

static SERVICE_AREA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:do you|can you)\s+(?:service|cover|serve|come to|come out to)\s+([A-Za-z .'-]+)\??").unwrap());

const EMERGENCY_WORDS: &[&str] = &["emergency", "flooding", "gas smell", "no heat", "right away", "urgent"];
const URGENT_WORDS: &[&str] = &["asap", "soon as possible", "today", "right now"];

/// Orchestrates a single dialogue turn. Cheap to construct per-call; the
/// gateway and loggers are shared, reference-counted handles.
pub struct DialogueTurnProcessor {
    llm: Arc<dyn LlmGateway>,
    trace_logger: Arc<dyn TraceLogger>,
    black_box: Arc<dyn BlackBoxLogger>,
}

impl DialogueTurnProcessor {
    pub fn new(llm: Arc<dyn LlmGateway>, trace_logger: Arc<dyn TraceLogger>, black_box: Arc<dyn BlackBoxLogger>) -> Self {
        Self { llm, trace_logger, black_box }
    }

    pub async fn process_turn(&self, tenant: &Tenant, mut call_state: CallState, utterance: &str) -> TurnOutcome {
        let trimmed = utterance.trim();
        call_state.push_turn(TurnRole::Caller, trimmed);

        if let Some(outcome) = self.try_quick_answer(tenant, &call_state, trimmed) {
            self.finish(tenant, &mut call_state, trimmed, &outcome);
            return self.into_outcome(call_state, outcome);
        }

        if let Some(outcome) = self.try_service_area(tenant, trimmed) {
            self.finish(tenant, &mut call_state, trimmed, &outcome);
            return self.into_outcome(call_state, outcome);
        }

        let triage_card = self.triage_context(tenant, trimmed);
        let mut forced_triage = false;
        let mut urgency = None;
        if let Some(card) = triage_card {
            urgency = Some(Self::derive_urgency(trimmed, card.urgency));
            if call_state.phase != Phase::Booking {
                forced_triage = true;
            }
        }

        let extracted = SlotExtractor::extract(trimmed);
        merge_slots(&mut call_state.known_slots, extracted);

        call_state.service_type_resolution = if call_state.service_type_resolution.state == ResolutionState::Clarifying {
            ServiceTypeResolver::resolve_clarification(&call_state.service_type_resolution, trimmed)
        } else {
            ServiceTypeResolver::resolve(&call_state.service_type_resolution, trimmed)
        };
        if call_state.service_type_resolution.state == ResolutionState::Clarifying {
            if let Some(clarifier) = call_state.service_type_resolution.clarifier {
                let outcome = RawOutcome {
                    reply: clarifier.question_text().to_string(),
                    source: TurnSource::Llm,
                    mode: TurnMode::Discovery,
                    signals: TurnSignals::default(),
                    next_goal: Some("clarify_service_type".to_string()),
                    urgency: None,
                };
                self.finish(tenant, &mut call_state, trimmed, &outcome);
                return self.into_outcome(call_state, outcome);
            }
        }

        let (system_prompt, user_message) = self.build_prompt(tenant, &call_state, trimmed, triage_card);
        let request = LlmRequest { system_prompt, user_message, json_mode: true };

        let first = self.llm.generate(LlmRole::DialogueLlm, request.clone()).await;
        let parsed = match first {
            Ok(response) => Self::parse_reply(&response.text),
            Err(_) => None,
        };

        let outcome = match parsed {
            Some(parsed) if !Self::is_repetitive(&parsed.reply, call_state.last_assistant_reply.as_deref()) => {
                self.finalize_llm_turn(tenant, &mut call_state, parsed, forced_triage, urgency)
            }
            Some(_first_parsed) => {
                // Anti-repetition retry: the prompt already carries the
                // YOU-JUST-SAID instruction, so a second call is given one
                // more chance before degrading.
                let retry = self.llm.generate(LlmRole::DialogueLlm, request).await;
                match retry.ok().and_then(|r| Self::parse_reply(&r.text)) {
                    Some(parsed) if !Self::is_repetitive(&parsed.reply, call_state.last_assistant_reply.as_deref()) => {
                        self.finalize_llm_turn(tenant, &mut call_state, parsed, forced_triage, urgency)
                    }
                    _ => self.emergency_fallback(&call_state),
                }
            }
            None => self.emergency_fallback(&call_state),
        };

        self.finish(tenant, &mut call_state, trimmed, &outcome);
        self.into_outcome(call_state, outcome)
    }

    fn try_quick_answer(&self, tenant: &Tenant, call_state: &CallState, utterance: &str) -> Option<RawOutcome> {
        if !Self::looks_like_question(utterance) {
            return None;
        }
        let normalized = utterance.to_lowercase();
        let best = tenant
            .quick_answers
            .iter()
            .map(|qa| (qa, qa.score(&normalized)))
            .filter(|(_, score)| *score > i64::MIN)
            .max_by_key(|(_, score)| *score)?;

        let mut reply = best.0.answer.clone();
        if call_state.phase == Phase::Booking {
            if let Some(next_slot) = SlotName::required_booking_slots().into_iter().find(|n| !call_state.known_slots.contains_key(n)) {
                reply.push_str(&format!(" Now, to help you further, {}", booking_question(next_slot)));
            }
        } else {
            reply.push_str(" If you'd like, I can go ahead and get you scheduled.");
        }

        Some(RawOutcome {
            reply,
            source: TurnSource::QuickAnswer,
            mode: phase_to_mode(call_state.phase),
            signals: TurnSignals::default(),
            next_goal: None,
            urgency: None,
        })
    }

    fn try_service_area(&self, tenant: &Tenant, utterance: &str) -> Option<RawOutcome> {
        let captures = SERVICE_AREA_PATTERN.captures(utterance)?;
        let city = captures.get(1)?.as_str().trim().trim_end_matches('?');
        let known = tenant.service_area.iter().any(|area| area.eq_ignore_ascii_case(city));

        let reply = if known {
            format!("Yes, we absolutely service {city}, is there anything else I can help you with?")
        } else {
            format!("We'll do our best to get someone out to {city} — let me get a few details so we can check.")
        };

        Some(RawOutcome {
            reply,
            source: TurnSource::ServiceArea,
            mode: TurnMode::Discovery,
            signals: TurnSignals::default(),
            next_goal: None,
            urgency: None,
        })
    }

    fn triage_context<'a>(&self, tenant: &'a Tenant, utterance: &str) -> Option<&'a TriageCard> {
        let lower = utterance.to_lowercase();
        tenant
            .active_triage_cards()
            .filter(|card| {
                let has_all_required =
                    card.keywords_must_have.is_empty() || card.keywords_must_have.iter().all(|k| lower.contains(&k.to_lowercase()));
                let has_excluded = card.keywords_exclude.iter().any(|k| lower.contains(&k.to_lowercase()));
                has_all_required && !has_excluded && !card.keywords_must_have.is_empty()
            })
            .max_by_key(|card| (card.keywords_must_have.len() as i32, card.priority))
    }

    fn derive_urgency(utterance: &str, fallback: Urgency) -> Urgency {
        let lower = utterance.to_lowercase();
        if EMERGENCY_WORDS.iter().any(|w| lower.contains(w)) {
            Urgency::Emergency
        } else if URGENT_WORDS.iter().any(|w| lower.contains(w)) {
            Urgency::Urgent
        } else {
            fallback
        }
    }

    fn build_prompt(
        &self,
        tenant: &Tenant,
        call_state: &CallState,
        utterance: &str,
        triage_card: Option<&TriageCard>,
    ) -> (String, String) {
        PromptBuilder::new()
            .persona(
                &tenant.personality.name,
                &tenant.personality.tone_descriptors,
                tenant.personality.max_response_words,
                &tenant.personality.forbidden_phrases,
            )
            .known_slots(&call_state.known_slots)
            .missing_slots(&call_state.known_slots)
            .triage_card(triage_card)
            .history(&call_state.history)
            .avoid_repeating(call_state.last_assistant_reply.as_deref())
            .turn_number(call_state.turn_count)
            .user_message(utterance)
            .build()
    }

    /// Accepts the compact `{reply, needsInfo}` shape first, falling back
    /// to the richer phase-carrying shape, and finally raw text per §4.10
    /// step 8's degrade rule.
    fn parse_reply(text: &str) -> Option<ParsedLlmReply> {
        if let Ok(compact) = serde_json::from_str::<CompactReply>(text) {
            if let Some(reply) = compact.reply {
                let needs_info = compact.needs_info.filter(|n| n != "none");
                return Some(ParsedLlmReply {
                    reply,
                    needs_info,
                    phase_hint: None,
                    filled_slots: HashMap::new(),
                    signals: TurnSignals::default(),
                });
            }
        }
        if let Ok(rich) = serde_json::from_str::<PhaseReply>(text) {
            if let Some(reply) = rich.reply {
                return Some(ParsedLlmReply {
                    reply,
                    needs_info: if rich.wants_booking { Some("booking".to_string()) } else { None },
                    phase_hint: rich.phase.as_deref().and_then(parse_phase_hint),
                    filled_slots: rich.filled_slots,
                    signals: TurnSignals { frustration: rich.signals.frustration, wants_human: rich.signals.wants_human },
                });
            }
        }
        if text.trim().is_empty() {
            return None;
        }
        Some(ParsedLlmReply {
            reply: text.trim().to_string(),
            needs_info: None,
            phase_hint: None,
            filled_slots: HashMap::new(),
            signals: TurnSignals::default(),
        })
    }

    fn is_repetitive(reply: &str, last: Option<&str>) -> bool {
        let Some(last) = last else { return false };
        let reply_words: std::collections::HashSet<&str> = reply.unicode_words().collect();
        let last_words: std::collections::HashSet<&str> = last.unicode_words().collect();
        if reply_words.is_empty() || last_words.is_empty() {
            return false;
        }
        let overlap = reply_words.intersection(&last_words).count();
        let union = reply_words.union(&last_words).count();
        (overlap as f32 / union as f32) > 0.85
    }

    fn finalize_llm_turn(
        &self,
        tenant: &Tenant,
        call_state: &mut CallState,
        parsed: ParsedLlmReply,
        forced_triage: bool,
        urgency: Option<Urgency>,
    ) -> RawOutcome {
        let mut filled = recept_core::SlotMap::new();
        for (key, value) in &parsed.filled_slots {
            if let Some(name) = parse_slot_name(key) {
                filled.insert(name, recept_core::SlotValue::new(value.clone(), 0.85, "llm:filledSlots"));
            }
        }
        merge_slots(&mut call_state.known_slots, filled);

        let all_required_known = SlotName::required_booking_slots().iter().all(|n| call_state.known_slots.contains_key(n));
        let mode = if all_required_known {
            TurnMode::Confirmation
        } else if parsed.needs_info.is_some() {
            TurnMode::Booking
        } else if forced_triage {
            TurnMode::Triage
        } else {
            TurnMode::Discovery
        };

        if let Some(hint) = parsed.phase_hint {
            call_state.advance_phase(hint);
        } else {
            let inferred = match mode {
                TurnMode::Confirmation => Phase::Confirmation,
                TurnMode::Booking => Phase::Booking,
                _ => call_state.phase,
            };
            call_state.advance_phase(inferred);
        }

        let mut signals = parsed.signals;
        signals.frustration = signals.frustration || Self::matches_any(&tenant.personality.forbidden_phrases, &parsed.reply);
        signals.wants_human = signals.wants_human;

        RawOutcome { reply: parsed.reply, source: TurnSource::Llm, mode, signals, next_goal: parsed.needs_info, urgency }
    }

    fn matches_any(triggers: &[String], text: &str) -> bool {
        if triggers.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        triggers.iter().any(|t| lower.contains(&t.to_lowercase()))
    }

    /// §7 Emergency Fallback: a reply driven only by phase and known
    /// slots, used when the dialogue LLM is unavailable or degenerately
    /// repetitive across a retry.
    fn emergency_fallback(&self, call_state: &CallState) -> RawOutcome {
        let reply = match call_state.phase {
            Phase::Discovery => "I'm having a little trouble understanding — could you tell me a bit more about what's going on?".to_string(),
            Phase::Booking => {
                if let Some(next) = SlotName::required_booking_slots().into_iter().find(|n| !call_state.known_slots.contains_key(n)) {
                    format!("Let's get you booked — {}", booking_question(next))
                } else {
                    "Let me get someone to follow up with you directly to finish booking.".to_string()
                }
            }
            Phase::Confirmation => "Let me have someone confirm those details with you directly.".to_string(),
        };
        RawOutcome {
            reply,
            source: TurnSource::EmergencyFallback,
            mode: phase_to_mode(call_state.phase),
            signals: TurnSignals { frustration: false, wants_human: true },
            next_goal: None,
            urgency: None,
        }
    }

    fn finish(&self, tenant: &Tenant, call_state: &mut CallState, utterance: &str, outcome: &RawOutcome) {
        let trade_fallbacks = HashMap::new();
        let known_slots_as_strings: HashMap<String, String> =
            call_state.known_slots.iter().map(|(k, v)| (k.as_str().to_string(), v.value.clone())).collect();
        let resolver = PlaceholderResolver::new(&tenant.placeholder_values, &trade_fallbacks, &known_slots_as_strings);
        let resolved = resolver.resolve(&outcome.reply, &recept_core::ResolveOptions::default());

        call_state.record_assistant_reply(resolved.text.clone());

        if outcome.source == TurnSource::QuickAnswer {
            let black_box = Arc::clone(&self.black_box);
            let tenant_id = tenant.tenant_id.clone();
            tokio::spawn(async move {
                black_box.log_event(BlackBoxEvent::QuickAnswerUsed, &tenant_id, "quick_answer matched").await;
            });
        }

        if let Some(urgency) = outcome.urgency {
            let black_box = Arc::clone(&self.black_box);
            let tenant_id = tenant.tenant_id.clone();
            tokio::spawn(async move {
                black_box
                    .log_event(BlackBoxEvent::SectionTrail, &tenant_id, &format!("triage urgency: {urgency:?}"))
                    .await;
            });
        }

        let trace_logger = Arc::clone(&self.trace_logger);
        let trace = TurnTrace {
            tenant_id: tenant.tenant_id.clone(),
            call_id: call_state.call_id.clone(),
            turn_number: call_state.turn_count,
            utterance: utterance.to_string(),
            response: resolved.text,
            tier: "dialogue".to_string(),
            confidence: 1.0,
            latency_ms: 0,
        };
        tokio::spawn(async move {
            trace_logger.log_turn(trace).await;
        });
    }

    fn into_outcome(&self, updated_state: CallState, outcome: RawOutcome) -> TurnOutcome {
        TurnOutcome {
            reply: updated_state.last_assistant_reply.clone().unwrap_or(outcome.reply),
            updated_state,
            signals: outcome.signals,
            mode: outcome.mode,
            next_goal: outcome.next_goal,
            source: outcome.source,
        }
    }

    fn looks_like_question(utterance: &str) -> bool {
        let lower = utterance.trim().to_lowercase();
        if lower.ends_with('?') {
            return true;
        }
        QUESTION_STARTERS.iter().any(|starter| lower.starts_with(starter))
    }
}

/// Pre-placeholder-resolution outcome, before the reply is resolved and
/// recorded onto `CallState` by `finish`.
struct RawOutcome {
    reply: String,
    source: TurnSource,
    mode: TurnMode,
    signals: TurnSignals,
    next_goal: Option<String>,
    urgency: Option<Urgency>,
}

fn phase_to_mode(phase: Phase) -> TurnMode {
    match phase {
        Phase::Discovery => TurnMode::Discovery,
        Phase::Booking => TurnMode::Booking,
        Phase::Confirmation => TurnMode::Confirmation,
    }
}

fn parse_phase_hint(raw: &str) -> Option<Phase> {
    match raw.to_lowercase().as_str() {
        "discovery" => Some(Phase::Discovery),
        "booking" => Some(Phase::Booking),
        "confirmation" => Some(Phase::Confirmation),
        _ => None,
    }
}

fn parse_slot_name(raw: &str) -> Option<SlotName> {
    match raw {
        "name" => Some(SlotName::Name),
        "phone" => Some(SlotName::Phone),
        "address" => Some(SlotName::Address),
        "time" => Some(SlotName::Time),
        "serviceType" => Some(SlotName::ServiceType),
        _ => None,
    }
}

fn booking_question(slot: SlotName) -> String {
    match slot {
        SlotName::Name => "could I get your full name?".to_string(),
        SlotName::Phone => "what's the best phone number to reach you?".to_string(),
        SlotName::Address => "what's the address we'd be coming out to?".to_string(),
        SlotName::Time => "what day and time works best for you?".to_string(),
        SlotName::ServiceType => "can you tell me more about what you need done?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use recept_core::{LlmResponse, QuickAnswer};
    use std::sync::Mutex;

    struct FixedGateway {
        response: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmGateway for FixedGateway {
        async fn generate(&self, _role: LlmRole, _request: LlmRequest) -> recept_core::Result<LlmResponse> {
            let mut queue = self.response.lock().unwrap();
            let text = if queue.len() > 1 { queue.remove(0) } else { queue[0].clone() };
            Ok(LlmResponse { text, prompt_tokens: 10, completion_tokens: 10, latency_ms: 5 })
        }
    }

    struct NoopTrace;
    #[async_trait]
    impl TraceLogger for NoopTrace {
        async fn log_turn(&self, _trace: TurnTrace) {}
    }

    struct NoopBlackBox;
    #[async_trait]
    impl BlackBoxLogger for NoopBlackBox {
        async fn log_event(&self, _event: BlackBoxEvent, _tenant_id: &str, _detail: &str) {}
    }

    fn tenant_with_quick_answer() -> Tenant {
        let mut tenant = Tenant {
            tenant_id: "t1".into(),
            intelligence_mode: recept_core::IntelligenceMode::Global,
            scenarios: Vec::new(),
            triage_cards: Vec::new(),
            quick_answers: vec![QuickAnswer {
                id: "hours".into(),
                question: "what are your hours?".into(),
                answer: "We're open 8 AM to 6 PM.".into(),
                category: None,
                triggers: vec!["hours".into(), "open".into()],
                enabled: true,
                priority: 1,
            }],
            tier_thresholds: Default::default(),
            source_thresholds: Default::default(),
            features: Default::default(),
            personality: Default::default(),
            placeholder_values: HashMap::new(),
            service_area: vec!["Fort Myers".to_string()],
            monthly_llm_budget: 50.0,
            current_llm_spend: 0.0,
            estimated_tier3_call_cost: 0.5,
            priority_flow: Vec::new(),
            company_qna: Vec::new(),
            trade_qna: Vec::new(),
            templates: Vec::new(),
            in_house_fallback: Default::default(),
        };
        tenant.personality.name = "Dana".to_string();
        tenant
    }

    fn processor(reply: &str) -> DialogueTurnProcessor {
        DialogueTurnProcessor::new(
            Arc::new(FixedGateway { response: Mutex::new(vec![reply.to_string()]) }),
            Arc::new(NoopTrace),
            Arc::new(NoopBlackBox),
        )
    }

    #[tokio::test]
    async fn quick_answer_short_circuits_in_booking_mode() {
        let tenant = tenant_with_quick_answer();
        let mut call_state = CallState::new("call-1");
        call_state.advance_phase(Phase::Booking);
        call_state
            .known_slots
            .insert(SlotName::Name, recept_core::SlotValue::new("Alice", 0.9, "explicit"));

        let processor = processor(r#"{"reply":"unused"}"#);
        let outcome = processor.process_turn(&tenant, call_state, "what are your hours?").await;

        assert_eq!(outcome.source, TurnSource::QuickAnswer);
        assert!(outcome.reply.starts_with("We're open 8 AM to 6 PM."));
        assert!(outcome.reply.contains("phone number"));
    }

    #[tokio::test]
    async fn service_area_question_short_circuits() {
        let tenant = tenant_with_quick_answer();
        let call_state = CallState::new("call-2");
        let processor = processor(r#"{"reply":"unused"}"#);

        let outcome = processor.process_turn(&tenant, call_state, "do you service Fort Myers?").await;

        assert_eq!(outcome.source, TurnSource::ServiceArea);
        assert!(outcome.reply.starts_with("Yes, we absolutely service Fort Myers"));
    }

    #[tokio::test]
    async fn llm_reply_is_placeholder_resolved_and_recorded() {
        let mut tenant = tenant_with_quick_answer();
        tenant.quick_answers.clear();
        tenant.placeholder_values.insert("companyName".to_string(), "Acme Plumbing".to_string());
        let call_state = CallState::new("call-3");
        let processor = processor(r#"{"reply":"Thanks for calling {companyName}, what's going on?","needsInfo":"phone"}"#);

        let outcome = processor.process_turn(&tenant, call_state, "my sink is leaking").await;

        assert_eq!(outcome.source, TurnSource::Llm);
        assert!(outcome.reply.contains("Acme Plumbing"));
        assert_eq!(outcome.mode, TurnMode::Booking);
        assert_eq!(outcome.updated_state.phase, Phase::Booking);
    }

    #[tokio::test]
    async fn unparseable_llm_output_falls_back_to_raw_text() {
        let mut tenant = tenant_with_quick_answer();
        tenant.quick_answers.clear();
        let call_state = CallState::new("call-4");
        let processor = processor("Sure, I can help with that.");

        let outcome = processor.process_turn(&tenant, call_state, "tell me about your pricing").await;

        assert_eq!(outcome.reply, "Sure, I can help with that.");
    }

    #[tokio::test]
    async fn confirmation_mode_once_all_slots_known() {
        let mut tenant = tenant_with_quick_answer();
        tenant.quick_answers.clear();
        let mut call_state = CallState::new("call-5");
        call_state.known_slots.insert(SlotName::Name, recept_core::SlotValue::new("Alice", 0.9, "x"));
        call_state.known_slots.insert(SlotName::Phone, recept_core::SlotValue::new("555-010-1234", 0.9, "x"));
        call_state.known_slots.insert(SlotName::Address, recept_core::SlotValue::new("1 Main St", 0.9, "x"));
        call_state.known_slots.insert(SlotName::Time, recept_core::SlotValue::new("tomorrow 9am", 0.9, "x"));
        let processor = processor(r#"{"reply":"Great, you're all set.","needsInfo":"none"}"#);

        let outcome = processor.process_turn(&tenant, call_state, "that's everything").await;

        assert_eq!(outcome.mode, TurnMode::Confirmation);
        assert_eq!(outcome.updated_state.phase, Phase::Confirmation);
    }
}
