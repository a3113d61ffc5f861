//! Built-in sample word supply for practice sessions. The engine itself
//! takes any pre-supplied ordered word sequence; this is just the default.

use rand::seq::SliceRandom;

/// Duration presets offered by the front-end; 0 is the open stopwatch.
pub const DURATION_PRESETS: [u64; 4] = [15, 30, 60, 0];

pub const SAMPLE_WORDS: [&str; 30] = [
    "about",
    "after",
    "again",
    "animal",
    "around",
    "before",
    "between",
    "cause",
    "change",
    "country",
    "different",
    "example",
    "father",
    "follow",
    "great",
    "house",
    "important",
    "large",
    "little",
    "mother",
    "number",
    "other",
    "people",
    "place",
    "point",
    "right",
    "small",
    "student",
    "system",
    "water",
];

/// Produce `count` target words from the sample list, cycling when more are
/// requested than the list holds.
pub fn sample_words(count: usize, shuffle: bool) -> Vec<String> {
    let mut pool: Vec<&str> = SAMPLE_WORDS.to_vec();
    if shuffle {
        pool.shuffle(&mut rand::thread_rng());
    }
    pool.iter()
        .cycle()
        .take(count)
        .map(|w| w.to_string())
        .collect()
}
