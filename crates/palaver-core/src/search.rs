//! Directory search semantics.
//!
//! A query is split on '+' into terms that must ALL match (AND semantics at
//! the chat level). Matching is case-insensitive substring containment.

/// Parse a search query into lowercased terms. Empty terms are ignored, so
/// `"work++team"` and `" work + team "` both yield `["work", "team"]`.
pub fn parse_terms(query: &str) -> Vec<String> {
    query
        .split('+')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

/// Case-insensitive substring check against an already-lowercased term.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    text.to_lowercase().contains(term)
}

/// True when every term is found in the text. An empty term list matches
/// everything (an empty search box shows the full directory).
pub fn contains_all_terms(text: &str, terms: &[String]) -> bool {
    terms.iter().all(|term| contains_term(text, term))
}
