//! Per-character classification of typed input against a target word.

/// Classification of one position in a word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharOutcome {
    Correct,
    Incorrect,
    Untyped,
}

/// Ordered per-character classifications for a completed word.
///
/// Length equals the target word's length, or the typed length when the
/// participant typed past the end of the target (practice-mode overflow).
pub type WordResult = Vec<CharOutcome>;

/// Classify a single character position of `typed` against `target`.
pub fn classify(typed: &[char], target: &[char], idx: usize) -> CharOutcome {
    if idx >= typed.len() {
        return CharOutcome::Untyped;
    }
    if typed[idx] == target[idx] {
        CharOutcome::Correct
    } else {
        CharOutcome::Incorrect
    }
}

/// Build the full result for a completed word.
///
/// Overflow characters are never correct; they represent extra characters
/// typed past the target and each classifies as `Incorrect`.
pub fn build_word_result(typed: &str, target: &str) -> WordResult {
    let typed: Vec<char> = typed.chars().collect();
    let target: Vec<char> = target.chars().collect();

    let mut result: WordResult = (0..target.len())
        .map(|idx| classify(&typed, &target, idx))
        .collect();

    if typed.len() > target.len() {
        result.extend(std::iter::repeat(CharOutcome::Incorrect).take(typed.len() - target.len()));
    }

    result
}
