use serde::{Deserialize, Serialize};

/// Input-validation policy for a race.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Free edits, overflow typing allowed past the target word's length.
    #[default]
    Practice,
    /// Advance-only, character-gated typing: a key is accepted only when it
    /// matches the next required character.
    Multiplayer,
}

/// Everything needed to seed a race: the ordered word sequence, the session
/// duration (0 = open stopwatch) and the input policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub words: Vec<String>,
    pub duration_secs: u64,
    pub mode: Mode,
}

impl SessionConfig {
    pub fn new(words: Vec<String>, duration_secs: u64, mode: Mode) -> Self {
        debug_assert!(!words.is_empty(), "a race needs at least one word");
        Self {
            words,
            duration_secs,
            mode,
        }
    }
}
