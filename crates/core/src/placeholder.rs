//! PlaceholderResolver (C1, §4.1)
//!
//! Resolves `{key}`, `{{key}}` and `[key]` placeholder forms against a
//! tenant's placeholder values, with a small alias table for legacy key
//! spellings and a trade-fallback catalog for keys a tenant hasn't set.
//! Grounded on the teacher's `ResponseTemplates`
//! (`crates/llm/src/prompt.rs`), which does the same kind of
//! language-conditioned canned-text substitution, generalized here to an
//! arbitrary key/value catalog instead of a fixed language switch.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `{{key}}`, `{key}` and `[key]`, capturing the bare key name.
/// `{{...}}` is matched before `{...}` by trying the double-brace pattern
/// first in `resolve`.
static DOUBLE_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").unwrap());
static SINGLE_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\s*([a-zA-Z0-9_]+)\s*\}").unwrap());
static BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*([a-zA-Z0-9_]+)\s*\]").unwrap());

/// Legacy/alias key spellings normalized to the canonical catalog key.
fn normalize_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "company" | "company_name" | "companyname" => "companyName".to_string(),
        "biz_name" | "bizname" => "companyName".to_string(),
        "caller_name" | "callername" | "customer_name" | "customername" => "name".to_string(),
        "phone_number" | "phonenumber" => "phone".to_string(),
        other => other.to_string(),
    }
}

/// The Name-Safety Invariant placeholder key: this one must never be
/// emitted unresolved to a caller, per §4.1/§4.7.
pub const NAME_KEY: &str = "name";

/// Controls §4.1 step (d): what happens to a key that resolves through
/// neither tenant values nor the trade-fallback catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// `true` (the default): leave the token verbatim, a malformed
    /// template is more visible than silently vanished text. `false`:
    /// drop the token (and any resulting run of now-stray whitespace).
    pub leave_unknown: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { leave_unknown: true }
    }
}

/// Resolves placeholder tokens in a text fragment against tenant values,
/// a trade-level fallback catalog, and a known-slots map.
pub struct PlaceholderResolver<'a> {
    tenant_values: &'a HashMap<String, String>,
    trade_fallbacks: &'a HashMap<String, String>,
    known_slots: &'a HashMap<String, String>,
}

/// Outcome of resolving one piece of text (§4.1's `{text, replacements,
/// unknownTokens, fallbacksUsed}` contract).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedText {
    pub text: String,
    /// Canonical key names successfully substituted from a known slot or
    /// tenant value (does not include trade-fallback hits, see
    /// `fallbacks_used`).
    pub replacements: Vec<String>,
    /// Canonical key names that resolved through neither tenant values
    /// nor the trade-fallback catalog. Reported but never fails the call.
    pub unknown_tokens: Vec<String>,
    /// Canonical key names resolved through the trade-fallback catalog
    /// rather than an explicit tenant value.
    pub fallbacks_used: Vec<String>,
    /// True if a `{name}`-family placeholder had no value and had to be
    /// stripped rather than substituted (the Name-Safety fallback path,
    /// unconditional regardless of `ResolveOptions::leave_unknown`).
    pub name_fallback_used: bool,
}

enum Lookup {
    KnownSlot(String),
    TenantValue(String),
    TradeFallback(String),
    Unknown,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(
        tenant_values: &'a HashMap<String, String>,
        trade_fallbacks: &'a HashMap<String, String>,
        known_slots: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            tenant_values,
            trade_fallbacks,
            known_slots,
        }
    }

    /// §4.1 steps (b)-(c): known slots win over tenant values, tenant
    /// values win over the trade-fallback catalog.
    fn lookup(&self, canonical: &str) -> Lookup {
        if let Some(v) = self.known_slots.get(canonical) {
            return Lookup::KnownSlot(v.clone());
        }
        if let Some(v) = self.tenant_values.get(canonical) {
            return Lookup::TenantValue(v.clone());
        }
        if let Some(v) = self.trade_fallbacks.get(canonical) {
            return Lookup::TradeFallback(v.clone());
        }
        Lookup::Unknown
    }

    /// Resolve every placeholder occurrence in `text` under `opts`.
    pub fn resolve(&self, text: &str, opts: &ResolveOptions) -> ResolvedText {
        let mut name_fallback_used = false;
        let mut replacements = Vec::new();
        let mut unknown_tokens = Vec::new();
        let mut fallbacks_used = Vec::new();

        let mut substitute = |caps: &regex::Captures| -> String {
            let key = &caps[1];
            let canonical = normalize_key(key);
            match self.lookup(&canonical) {
                Lookup::KnownSlot(value) | Lookup::TenantValue(value) => {
                    replacements.push(canonical);
                    value
                }
                Lookup::TradeFallback(value) => {
                    fallbacks_used.push(canonical);
                    value
                }
                Lookup::Unknown => {
                    if canonical == NAME_KEY {
                        name_fallback_used = true;
                        unknown_tokens.push(canonical);
                        String::new()
                    } else {
                        unknown_tokens.push(canonical.clone());
                        if opts.leave_unknown {
                            caps[0].to_string()
                        } else {
                            String::new()
                        }
                    }
                }
            }
        };

        let mut out = DOUBLE_BRACE.replace_all(text, |caps: &regex::Captures| substitute(caps)).into_owned();
        out = SINGLE_BRACE.replace_all(&out, |caps: &regex::Captures| substitute(caps)).into_owned();
        out = BRACKET.replace_all(&out, |caps: &regex::Captures| substitute(caps)).into_owned();

        if name_fallback_used || (!opts.leave_unknown && !unknown_tokens.is_empty()) {
            out = collapse_whitespace(&out);
        }

        ResolvedText {
            text: out,
            replacements,
            unknown_tokens,
            fallbacks_used,
            name_fallback_used,
        }
    }
}

/// Collapse runs of whitespace left behind by stripping a placeholder, and
/// trim stray leading punctuation like ", " that often precedes `{name}`.
fn collapse_whitespace(text: &str) -> String {
    let collapsed: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .replace(" ,", ",")
        .replace(" .", ".")
        .replace(" !", "!")
        .replace(" ?", "?")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_tenant_value() {
        let mut tenant_values = HashMap::new();
        tenant_values.insert("companyName".to_string(), "Acme Plumbing".to_string());
        let trade = HashMap::new();
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Thanks for calling {companyName}!", &ResolveOptions::default());
        assert_eq!(resolved.text, "Thanks for calling Acme Plumbing!");
        assert!(!resolved.name_fallback_used);
        assert_eq!(resolved.replacements, vec!["companyName".to_string()]);
        assert!(resolved.unknown_tokens.is_empty());
        assert!(resolved.fallbacks_used.is_empty());
    }

    #[test]
    fn falls_back_to_trade_catalog() {
        let tenant_values = HashMap::new();
        let mut trade = HashMap::new();
        trade.insert("companyName".to_string(), "Your Local Plumber".to_string());
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("[companyName] can help.", &ResolveOptions::default());
        assert_eq!(resolved.text, "Your Local Plumber can help.");
        assert_eq!(resolved.fallbacks_used, vec!["companyName".to_string()]);
        assert!(resolved.replacements.is_empty());
    }

    #[test]
    fn strips_unknown_name_rather_than_leaking_braces() {
        let tenant_values = HashMap::new();
        let trade = HashMap::new();
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Thanks, {name}, we'll call you back.", &ResolveOptions::default());
        assert!(resolved.name_fallback_used);
        assert!(!resolved.text.contains('{'));
        assert!(!resolved.text.contains("name"));
        assert_eq!(resolved.unknown_tokens, vec!["name".to_string()]);
    }

    #[test]
    fn leaves_unknown_non_name_key_verbatim_by_default() {
        let tenant_values = HashMap::new();
        let trade = HashMap::new();
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Visit {somethingUnset} today.", &ResolveOptions::default());
        assert_eq!(resolved.text, "Visit {somethingUnset} today.");
        assert_eq!(resolved.unknown_tokens, vec!["somethingunset".to_string()]);
    }

    #[test]
    fn drops_unknown_non_name_key_when_leave_unknown_is_false() {
        let tenant_values = HashMap::new();
        let trade = HashMap::new();
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Visit {somethingUnset} today.", &ResolveOptions { leave_unknown: false });
        assert_eq!(resolved.text, "Visit today.");
        assert_eq!(resolved.unknown_tokens, vec!["somethingunset".to_string()]);
    }

    #[test]
    fn double_brace_form_resolves() {
        let mut tenant_values = HashMap::new();
        tenant_values.insert("companyName".to_string(), "Acme".to_string());
        let trade = HashMap::new();
        let slots = HashMap::new();
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Welcome to {{companyName}}.", &ResolveOptions::default());
        assert_eq!(resolved.text, "Welcome to Acme.");
    }

    #[test]
    fn known_slot_wins_over_tenant_value() {
        let mut tenant_values = HashMap::new();
        tenant_values.insert("name".to_string(), "Default".to_string());
        let trade = HashMap::new();
        let mut slots = HashMap::new();
        slots.insert("name".to_string(), "Alice".to_string());
        let resolver = PlaceholderResolver::new(&tenant_values, &trade, &slots);

        let resolved = resolver.resolve("Hi {name}!", &ResolveOptions::default());
        assert_eq!(resolved.text, "Hi Alice!");
        assert_eq!(resolved.replacements, vec!["name".to_string()]);
    }
}
