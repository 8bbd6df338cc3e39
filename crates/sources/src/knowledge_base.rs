//! Knowledge-source pooling and scoring for the `PriorityKnowledgeRouter`
//! (C8, §4.8): company/trade Q&A, response templates, and the in-house
//! fallback categories. The raw records (`KnowledgeEntry`,
//! `InHouseFallback`, `FallbackCategory`) are plain data owned by
//! `recept_core::knowledge_source` so `Tenant` can carry them; this crate
//! owns the TF-IDF pooling and the blended-confidence scoring that turns
//! those records into matches.

use std::collections::HashSet;

use recept_core::{FallbackCategory, InHouseFallback, KnowledgeEntry};
use recept_knowledge::tokenize;

/// `0.4*textSimilarity + 0.6*keywordCoverage` scoring blend (§4.8), where
/// `text_similarity` is the TF-IDF cosine passed in by the caller
/// (computed once per index rather than per entry).
pub fn blended_confidence(entry: &KnowledgeEntry, query: &str, text_similarity: f32) -> f32 {
    let coverage = recept_knowledge::keyword_coverage(query, &entry.question);
    (0.4 * text_similarity + 0.6 * coverage).clamp(0.0, 1.0)
}

fn entry_vocabulary(entry: &KnowledgeEntry) -> HashSet<String> {
    tokenize(&entry.question).into_iter().collect()
}

/// Fraction of `category`'s keywords present in `query_tokens`.
fn match_fraction(category: &FallbackCategory, query_tokens: &HashSet<String>) -> f32 {
    if category.keywords.is_empty() {
        return 0.0;
    }
    let hits = category.keywords.iter().filter(|k| query_tokens.contains(&k.to_lowercase())).count();
    hits as f32 / category.keywords.len() as f32
}

/// First category whose keyword match exceeds 0.3, confidence
/// `max(match, 0.5)`; otherwise the ultimate fallback at confidence 0.5
/// (§4.8) — this never returns a miss.
pub fn resolve_fallback(fallback: &InHouseFallback, query: &str) -> (String, f32) {
    let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
    let categories = [
        &fallback.emergency_situations,
        &fallback.service_requests,
        &fallback.booking_requests,
        &fallback.general_inquiries,
    ];
    for category in categories {
        let fraction = match_fraction(category, &query_tokens);
        if fraction > 0.3 {
            return (category.response.clone(), fraction.max(0.5));
        }
    }
    (fallback.ultimate_fallback.clone(), 0.5)
}

/// One knowledge pool (companyQnA, tradeQnA, or templates) with its
/// precomputed TF-IDF index and O(1) vocabulary pre-filter, per §4.8 step 1.
pub struct EntryPool {
    entries: Vec<KnowledgeEntry>,
    index: recept_knowledge::TfidfIndex,
    vocabulary: HashSet<String>,
}

impl EntryPool {
    pub fn build(entries: Vec<KnowledgeEntry>) -> Self {
        let documents: Vec<(String, String)> = entries
            .iter()
            .filter(|e| e.enabled)
            .map(|e| (e.id.clone(), e.question.clone()))
            .collect();
        let index = recept_knowledge::TfidfIndex::build(documents.iter().map(|(id, q)| (id.clone(), q.as_str())));
        let vocabulary = entries.iter().filter(|e| e.enabled).flat_map(entry_vocabulary).collect();
        Self { entries, index, vocabulary }
    }

    /// O(1) vocabulary-overlap pre-filter (§4.8 step 1): a query sharing no
    /// token with this pool's vocabulary cannot score above zero, so it is
    /// rejected before any per-entry scoring.
    pub fn overlaps(&self, query_tokens: &HashSet<String>) -> bool {
        query_tokens.iter().any(|t| self.vocabulary.contains(t))
    }

    /// Best entry by the blended confidence (§4.8), or `None` if the pool
    /// is empty or nothing in it shares vocabulary with `query`.
    pub fn best_match(&self, query: &str) -> Option<(&KnowledgeEntry, f32)> {
        let (best_id, similarity) = self.index.score(query).into_iter().next()?;
        let entry = self.entries.iter().find(|e| e.enabled && e.id == best_id)?;
        Some((entry, blended_confidence(entry, query, similarity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, question: &str, answer: &str) -> KnowledgeEntry {
        KnowledgeEntry { id: id.to_string(), question: question.to_string(), answer: answer.to_string(), category: None, ai_agent_role: None, enabled: true }
    }

    #[test]
    fn pool_rejects_queries_outside_its_vocabulary() {
        let pool = EntryPool::build(vec![entry("hours", "what are your business hours", "8 to 6")]);
        let tokens: HashSet<String> = tokenize("completely unrelated query").into_iter().collect();
        assert!(!pool.overlaps(&tokens));
    }

    #[test]
    fn pool_finds_best_match_by_blended_confidence() {
        let pool = EntryPool::build(vec![entry("hours", "what are your business hours", "8 to 6")]);
        let (best, confidence) = pool.best_match("what are your business hours").unwrap();
        assert_eq!(best.answer, "8 to 6");
        assert!(confidence > 0.0);
    }

    #[test]
    fn fallback_resolves_to_ultimate_when_no_category_matches() {
        let fallback = InHouseFallback::default();
        let (response, confidence) = resolve_fallback(&fallback, "anything at all");
        assert_eq!(response, fallback.ultimate_fallback);
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn fallback_resolves_to_matching_category() {
        let fallback = InHouseFallback {
            emergency_situations: FallbackCategory { keywords: vec!["flood".into(), "gas".into(), "leak".into()], response: "Dispatching emergency tech now.".into() },
            ..Default::default()
        };
        let (response, confidence) = resolve_fallback(&fallback, "there is a gas leak");
        assert_eq!(response, "Dispatching emergency tech now.");
        assert!(confidence >= 0.5);
    }
}
