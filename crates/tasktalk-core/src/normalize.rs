//! Text normalization for pattern matching.
//!
//! Classification rules are evaluated against normalized text so that
//! casing, stray whitespace and contractions never change the outcome.

/// Lowercase, collapse whitespace runs to single spaces and expand a fixed
/// table of contractions. Idempotent: normalizing twice changes nothing.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    // Specific contractions first; the generic "n't" catch-all last so it
    // only sees forms the specific rules did not consume.
    collapsed
        .replace("i'm", "i am")
        .replace("don't", "do not")
        .replace("won't", "will not")
        .replace("can't", "cannot")
        .replace("n't", " not")
}
