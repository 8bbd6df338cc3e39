//! Prompt assembly for the dialogue turn processor (§4.10 step 6).
//!
//! Grounded on the teacher's `PromptBuilder` (`crates/llm/src/prompt.rs`):
//! the same chained-builder-over-a-message-list shape, but assembling
//! sections this system actually needs — personality, known/missing
//! slots, the active triage card, the anti-repetition instruction — in
//! place of the teacher's fixed gold-loan sales script.

use recept_core::{SlotMap, SlotName, TriageCard, Turn, TurnRole};

/// Turns carried into the prompt per §4.10 step 7: at most the last 6,
/// each truncated to roughly 200 characters.
const MAX_HISTORY_IN_PROMPT: usize = 6;
const MAX_TURN_CHARS: usize = 200;

/// A flattened chat message, independent of which gateway role consumes
/// it (`recept_core::LlmRequest` only needs one system string and one
/// user string, so `build()` joins these with blank lines).
#[derive(Debug, Clone)]
pub struct PromptSection {
    pub heading: Option<&'static str>,
    pub body: String,
}

pub struct PromptBuilder {
    sections: Vec<PromptSection>,
    user_message: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self { sections: Vec::new(), user_message: String::new() }
    }

    fn push(mut self, heading: Option<&'static str>, body: String) -> Self {
        if !body.trim().is_empty() {
            self.sections.push(PromptSection { heading, body });
        }
        self
    }

    pub fn persona(
        self,
        name: &str,
        tone_descriptors: &[String],
        max_response_words: u32,
        forbidden_phrases: &[String],
    ) -> Self {
        let mut body = format!(
            "You are {name}, the front-desk assistant answering calls for this business. \
             Keep replies to at most {max_response_words} words, speak naturally as on a phone call, \
             and never use bullet points or markdown."
        );
        if !tone_descriptors.is_empty() {
            body.push_str(&format!(" Tone: {}.", tone_descriptors.join(", ")));
        }
        if !forbidden_phrases.is_empty() {
            body.push_str(&format!(" Never say: {}.", forbidden_phrases.join("; ")));
        }
        self.push(Some("Persona"), body)
    }

    pub fn known_slots(self, slots: &SlotMap) -> Self {
        if slots.is_empty() {
            return self;
        }
        let mut lines = Vec::new();
        for name in [SlotName::Name, SlotName::Phone, SlotName::Address, SlotName::Time, SlotName::ServiceType] {
            if let Some(value) = slots.get(&name) {
                lines.push(format!("{}: {}", name.as_str(), value.value));
            }
        }
        self.push(Some("Known information"), lines.join("\n"))
    }

    pub fn missing_slots(self, slots: &SlotMap) -> Self {
        let missing: Vec<&str> = SlotName::required_booking_slots()
            .into_iter()
            .filter(|n| !slots.contains_key(n))
            .map(|n| n.as_str())
            .collect();
        if missing.is_empty() {
            return self;
        }
        self.push(Some("Still needed to book"), missing.join(", "))
    }

    pub fn triage_card(self, card: Option<&TriageCard>) -> Self {
        match card {
            Some(card) => {
                let mut body = card.explanation.clone();
                if !card.diagnostic_questions.is_empty() {
                    body.push_str(&format!("\nAsk: {}", card.diagnostic_questions.join(" / ")));
                }
                self.push(Some("Triage guidance"), body)
            }
            None => self,
        }
    }

    /// Anti-repetition instruction (§4.10 step 7): the model must not
    /// repeat its own last reply verbatim.
    pub fn avoid_repeating(self, last_assistant_reply: Option<&str>) -> Self {
        match last_assistant_reply {
            Some(prior) => self.push(
                Some("Do not repeat yourself"),
                format!("You just said: \"{prior}\". Say something different this turn."),
            ),
            None => self,
        }
    }

    /// Bounded conversation history (§4.10 step 7): last 6 turns, each
    /// truncated to ~200 characters so a long caller ramble can't blow out
    /// the prompt budget.
    pub fn history(self, turns: &[Turn]) -> Self {
        if turns.is_empty() {
            return self;
        }
        let start = turns.len().saturating_sub(MAX_HISTORY_IN_PROMPT);
        let lines: Vec<String> = turns[start..]
            .iter()
            .map(|t| {
                let speaker = match t.role {
                    TurnRole::Caller => "Caller",
                    TurnRole::Assistant => "Assistant",
                };
                let text = truncate(&t.text, MAX_TURN_CHARS);
                format!("{speaker}: {text}")
            })
            .collect();
        self.push(Some("Recent conversation"), lines.join("\n"))
    }

    pub fn turn_number(self, turn_number: u32) -> Self {
        self.push(Some("Turn"), format!("This is turn {turn_number} of the call."))
    }

    pub fn user_message(mut self, message: impl Into<String>) -> Self {
        self.user_message = message.into();
        self
    }

    /// Render to `(system_prompt, user_message)` for `recept_core::LlmRequest`.
    pub fn build(self) -> (String, String) {
        let system = self
            .sections
            .iter()
            .map(|s| match s.heading {
                Some(h) => format!("## {h}\n{}", s.body),
                None => s.body.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        (system, self.user_message)
    }

    pub fn estimate_tokens(&self) -> usize {
        let section_chars: usize = self.sections.iter().map(|s| s.body.len()).sum();
        (section_chars + self.user_message.len()) / 4
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('\u{2026}');
    truncated
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recept_core::SlotValue;

    #[test]
    fn builds_persona_and_user_message() {
        let (system, user) = PromptBuilder::new()
            .persona("Dana", &["warm".to_string()], 50, &[])
            .user_message("What are your hours?")
            .build();

        assert!(system.contains("Dana"));
        assert!(system.contains("50 words"));
        assert_eq!(user, "What are your hours?");
    }

    #[test]
    fn lists_missing_booking_slots() {
        let mut slots = SlotMap::new();
        slots.insert(SlotName::Name, SlotValue::new("Alice", 0.9, "explicit"));
        let (system, _) = PromptBuilder::new().missing_slots(&slots).user_message("").build();
        assert!(system.contains("phone"));
        assert!(!system.contains("name"));
    }

    #[test]
    fn empty_sections_are_omitted() {
        let (system, _) = PromptBuilder::new().known_slots(&SlotMap::new()).user_message("hi").build();
        assert!(system.is_empty());
    }

    #[test]
    fn anti_repetition_references_prior_reply() {
        let (system, _) = PromptBuilder::new()
            .avoid_repeating(Some("We're open 9 to 5."))
            .user_message("")
            .build();
        assert!(system.contains("We're open 9 to 5."));
    }

    #[test]
    fn history_keeps_only_last_six_turns() {
        let turns: Vec<Turn> = (0..10)
            .map(|i| Turn { role: TurnRole::Caller, text: format!("turn {i}"), turn_number: i })
            .collect();
        let (system, _) = PromptBuilder::new().history(&turns).user_message("").build();
        assert!(!system.contains("turn 0"));
        assert!(system.contains("turn 9"));
    }

    #[test]
    fn history_truncates_long_turns() {
        let long_text = "x".repeat(500);
        let turns = vec![Turn { role: TurnRole::Caller, text: long_text, turn_number: 1 }];
        let (system, _) = PromptBuilder::new().history(&turns).user_message("").build();
        assert!(system.len() < 500 + 100);
    }
}
