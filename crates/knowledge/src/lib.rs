//! Tier-2 semantic matching and the TF-IDF scoring primitives shared with
//! `recept-sources`'s company/trade QnA and template scoring (§4.5, §4.8).

pub mod matcher;
pub mod tfidf;

pub use matcher::{SemanticMatch, SemanticMatcher};
pub use tfidf::{keyword_coverage, tokenize, TfidfIndex};
