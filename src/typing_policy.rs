//! Write policies: free-edit practice vs. character-gated multiplayer typing.

use crate::race::Race;
use crate::session::Mode;

/// Apply a typed character to the race under its active input policy.
/// Returns whether the keystroke was accepted.
pub fn apply_write(race: &mut Race, c: char) -> bool {
    match race.mode {
        Mode::Practice => write_practice(race, c),
        Mode::Multiplayer => write_gated(race, c),
    }
}

/// Practice policy: every character is accepted. Typing past the target
/// word's length extends the working copy with an overflow character.
pub fn write_practice(race: &mut Race, c: char) -> bool {
    if race.typed_len() >= race.current_target_len() {
        let idx = race.current_word;
        race.working_words[idx].push(c);
    }
    race.typed.push(c);
    race.caret += 1;
    true
}

/// Gated policy: advance-only. The key is accepted only when it matches the
/// working word's character at `caret + 1`; otherwise the caret does not move
/// and nothing is recorded, so an incorrect character can never register.
pub fn write_gated(race: &mut Race, c: char) -> bool {
    let required = race
        .current_working()
        .chars()
        .nth((race.caret + 1) as usize);
    match required {
        Some(expected) if expected == c => {
            race.typed.push(c);
            race.caret += 1;
            true
        }
        _ => false,
    }
}
