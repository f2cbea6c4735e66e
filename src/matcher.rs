//! Response-content matching.
//!
//! Matching is intentionally loose: the assistant paraphrases freely, so a
//! verification passes when ANY whitespace-delimited word of the expected
//! phrase appears as a substring of the rendered response. Trivial words admit
//! false positives; keep expected phrases down to distinctive terms.

/// Known placeholder fragments the UI renders while a response is streaming.
const PROCESSING_MARKERS: &[&str] = &[
    "resolving context",
    "thinking",
    "processing",
    "loading",
    "please wait",
    "generating response",
    "...",
];

/// True when any word of `expected` is a case-insensitive substring of
/// `response`.
pub fn word_subset_matches(expected: &str, response: &str) -> bool {
    let response = response.to_lowercase();
    expected
        .to_lowercase()
        .split_whitespace()
        .any(|word| response.contains(word))
}

/// Whether the rendered text is still a streaming placeholder rather than a
/// complete response. Anything at or under 10 chars is treated as incomplete.
pub fn is_still_streaming(text: &str) -> bool {
    let text = text.trim();
    if text.chars().count() <= 10 {
        return true;
    }
    let lower = text.to_lowercase();
    PROCESSING_MARKERS.iter().any(|m| lower.contains(m))
}
