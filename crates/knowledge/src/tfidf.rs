//! Tier-2 semantic matcher: TF-IDF cosine similarity over scenario text.
//!
//! §4.5 permits either a real embedding model or TF-IDF cosine; this
//! workspace has no model runtime available, so it is TF-IDF throughout.
//! The stopword-filtered tokenization is carried over from the teacher's
//! `HybridRetriever::extract_keywords` (`crates/rag/src/retriever.rs`),
//! generalized from a 5-keyword cap to full-document TF-IDF vectors.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "i", "you", "we", "they",
        "it", "this", "that", "what", "which", "who", "whom", "whose", "to", "for", "in", "on",
        "at", "by", "with", "from", "and", "or", "but", "if", "then", "else", "do", "does", "did",
        "can", "could", "would", "should", "my", "your", "our",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, Unicode-word-boundary tokenize, and drop stopwords/short
/// tokens. Mirrors the teacher's filter (`len > 2`) but keeps the full
/// token stream rather than capping it, since TF-IDF needs the whole
/// document.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .unicode_words()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

fn term_frequencies(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for t in tokens {
        *counts.entry(t.as_str()).or_insert(0.0) += 1.0;
    }
    let total = tokens.len().max(1) as f64;
    for v in counts.values_mut() {
        *v /= total;
    }
    counts
}

/// A small corpus-level TF-IDF index over a fixed set of documents
/// (scenario utterance exemplars, QnA question text, templates, ...).
/// Built fresh per tenant-config refresh; cheap enough not to need
/// incremental updates.
pub struct TfidfIndex {
    /// document id -> term frequency map
    doc_term_freq: Vec<(String, HashMap<String, f64>)>,
    /// term -> inverse document frequency
    idf: HashMap<String, f64>,
}

impl TfidfIndex {
    pub fn build<'a>(documents: impl IntoIterator<Item = (String, &'a str)>) -> Self {
        let mut doc_term_freq = Vec::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for (id, text) in documents {
            let tokens = tokenize(text);
            let tf = term_frequencies(&tokens);
            for term in tf.keys() {
                *doc_freq.entry(term.to_string()).or_insert(0) += 1;
            }
            doc_term_freq.push((id, tf.into_iter().map(|(k, v)| (k.to_string(), v)).collect()));
        }

        let n = doc_term_freq.len().max(1) as f64;
        let idf = doc_freq
            .into_iter()
            .map(|(term, df)| (term, (n / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        Self { doc_term_freq, idf }
    }

    fn tfidf_vector<'a>(&self, tf: &'a HashMap<String, f64>) -> HashMap<&'a str, f64> {
        tf.iter()
            .map(|(term, freq)| {
                let idf = self.idf.get(term).copied().unwrap_or(1.0);
                (term.as_str(), freq * idf)
            })
            .collect()
    }

    /// Cosine similarity of `query` against every indexed document,
    /// returned as `(doc_id, score)` sorted descending by score.
    pub fn score(&self, query: &str) -> Vec<(String, f32)> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let query_tf: HashMap<String, f64> = term_frequencies(&query_tokens)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let query_vec = self.tfidf_vector(&query_tf);
        let query_norm = l2_norm(query_vec.values());

        let mut scored: Vec<(String, f32)> = self
            .doc_term_freq
            .iter()
            .map(|(id, tf)| {
                let doc_vec = self.tfidf_vector(tf);
                let doc_norm = l2_norm(doc_vec.values());
                let dot: f64 = query_vec
                    .iter()
                    .filter_map(|(term, qw)| doc_vec.get(term).map(|dw| qw * dw))
                    .sum();
                let denom = query_norm * doc_norm;
                let cosine = if denom > 0.0 { dot / denom } else { 0.0 };
                (id.clone(), cosine as f32)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// Top result above `min_score`, if any.
    pub fn best_match(&self, query: &str, min_score: f32) -> Option<(String, f32)> {
        self.score(query).into_iter().find(|(_, s)| *s >= min_score)
    }
}

fn l2_norm<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}

/// Keyword-coverage fraction: how many of `query`'s tokens appear in
/// `document`, used by the `0.4*textSimilarity + 0.6*keywordCoverage`
/// blend (§4.8) shared with `recept-sources`.
pub fn keyword_coverage(query: &str, document: &str) -> f32 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let doc_tokens: HashSet<String> = tokenize(document).into_iter().collect();
    let hits = query_tokens.iter().filter(|t| doc_tokens.contains(*t)).count();
    hits as f32 / query_tokens.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let tokens = tokenize("Is the heater leaking water?");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"is".to_string()));
        assert!(tokens.contains(&"heater".to_string()));
        assert!(tokens.contains(&"leaking".to_string()));
    }

    #[test]
    fn exact_match_scores_highest() {
        let index = TfidfIndex::build(vec![
            ("hours".to_string(), "what are your business hours"),
            ("pricing".to_string(), "how much does a repair cost"),
        ]);
        let results = index.score("what are your business hours");
        assert_eq!(results[0].0, "hours");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn unrelated_query_scores_near_zero() {
        let index = TfidfIndex::build(vec![("hours".to_string(), "what are your business hours")]);
        let results = index.score("zzz qqq unrelated gibberish");
        assert_eq!(results[0].1, 0.0);
    }

    #[test]
    fn keyword_coverage_counts_fraction_present() {
        let coverage = keyword_coverage("leaking heater pipe", "the heater is leaking badly");
        assert!(coverage > 0.5);
    }
}
