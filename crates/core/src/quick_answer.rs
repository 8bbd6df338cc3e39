//! QuickAnswer data model (§3, §4.10 step 2a)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAnswer {
    pub id: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_true() -> bool {
    true
}

impl QuickAnswer {
    /// Score per §4.10 step 2a: `10*matchedTriggers + 5*priority + sum(|trigger|)`
    /// over the triggers that actually matched the (lowercased) utterance.
    pub fn score(&self, normalized_utterance: &str) -> i64 {
        if !self.enabled {
            return i64::MIN;
        }
        let matched: Vec<&String> = self
            .triggers
            .iter()
            .filter(|t| normalized_utterance.contains(t.to_lowercase().as_str()))
            .collect();
        if matched.is_empty() {
            return i64::MIN;
        }
        let matched_len_sum: i64 = matched.iter().map(|t| t.len() as i64).sum();
        10 * matched.len() as i64 + 5 * self.priority as i64 + matched_len_sum
    }
}
