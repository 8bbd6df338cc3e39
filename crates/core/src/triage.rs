//! TriageCard data model (§3)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Normal,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageCard {
    pub id: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub keywords_must_have: Vec<String>,
    #[serde(default)]
    pub keywords_exclude: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub diagnostic_questions: Vec<String>,
    #[serde(default)]
    pub suggested_service_type: Option<String>,
    #[serde(default = "default_urgency")]
    pub urgency: Urgency,
}

fn default_true() -> bool {
    true
}

fn default_urgency() -> Urgency {
    Urgency::Routine
}
