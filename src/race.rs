//! The input state machine: turns raw key events into word/character
//! progress, correctness records and effects.

use std::collections::HashMap;

use crate::clock::SessionClock;
use crate::outcome::{build_word_result, WordResult};
use crate::session::{Mode, SessionConfig};
use crate::stats::{self, RaceStats};
use crate::typing_policy;

/// A raw key event after filtering out navigation/modifier keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// The word-separator key (space).
    Separator,
    Backspace,
}

/// Side effect requested by a state transition. The caller decides what to do
/// with each (start rendering a timer, emit a caret update, ...); the state
/// machine itself never touches a channel or an event loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// The first qualifying keystroke of the race landed; the session clock
    /// is now running.
    ClockStarted,
    /// The caret moved. Mirrors the outbound caret-update payload.
    CaretMoved { word_idx: usize, caret: i32 },
    /// The final word was completed; the race is over.
    Finished,
}

/// Result of applying one key event.
#[derive(Clone, Debug, PartialEq)]
pub struct Keystroke {
    /// Whether the key was accepted. Gated rejections and no-op separators /
    /// backspaces report `false` so the caller can fall back to default
    /// input handling consistently.
    pub accepted: bool,
    pub effects: Vec<Effect>,
}

impl Keystroke {
    fn rejected() -> Self {
        Self {
            accepted: false,
            effects: vec![],
        }
    }

    fn accepted(effects: Vec<Effect>) -> Self {
        Self {
            accepted: true,
            effects,
        }
    }
}

/// A race in progress: current word index, live typed buffer, caret offset
/// and per-word result history, plus the session clock.
///
/// The caret offset is the index of the last accepted character in the
/// current word; `-1` means nothing typed yet.
#[derive(Debug, Clone)]
pub struct Race {
    /// The immutable target sequence.
    pub target_words: Vec<String>,
    /// Working copies of the targets; practice-mode overflow characters are
    /// appended here and trimmed again on erase.
    pub working_words: Vec<String>,
    pub current_word: usize,
    pub typed: String,
    pub caret: i32,
    pub word_results: HashMap<usize, WordResult>,
    pub mode: Mode,
    pub clock: SessionClock,
    started: bool,
    finished: bool,
}

impl Race {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            working_words: config.words.clone(),
            target_words: config.words,
            current_word: 0,
            typed: String::new(),
            caret: -1,
            word_results: HashMap::new(),
            mode: config.mode,
            clock: SessionClock::new(config.duration_secs),
            started: false,
            finished: false,
        }
    }

    pub fn current_target(&self) -> &str {
        &self.target_words[self.current_word]
    }

    pub fn current_working(&self) -> &str {
        &self.working_words[self.current_word]
    }

    pub fn current_target_len(&self) -> usize {
        self.current_target().chars().count()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.chars().count()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn has_finished(&self) -> bool {
        self.finished
    }

    /// Apply one key event. Finished races ignore all input.
    pub fn on_key(&mut self, key: Key) -> Keystroke {
        if self.finished {
            return Keystroke::rejected();
        }
        match key {
            Key::Separator => self.advance_word(),
            Key::Backspace => self.erase_one(),
            Key::Char(c) => self.type_char(c),
        }
    }

    /// One second of clock time passed. Returns `true` when the countdown
    /// expired on this tick, which terminates the race.
    pub fn on_tick(&mut self) -> bool {
        if self.clock.on_tick() == crate::clock::TickOutcome::Expired {
            self.finished = true;
            true
        } else {
            false
        }
    }

    /// Final stats for this race. Countdown races score against the fixed
    /// duration, open races against the elapsed stopwatch time.
    pub fn final_stats(&self) -> RaceStats {
        stats::compute(
            &self.word_results,
            self.clock.duration_secs(),
            self.clock.seconds_elapsed(),
        )
    }

    /// Restore the race to its initial state, discarding overflow edits and
    /// cancelling any pending clock expiry.
    pub fn reset(&mut self) {
        self.working_words = self.target_words.clone();
        self.current_word = 0;
        self.typed.clear();
        self.caret = -1;
        self.word_results.clear();
        self.clock.reset();
        self.started = false;
        self.finished = false;
    }

    fn type_char(&mut self, c: char) -> Keystroke {
        if !typing_policy::apply_write(self, c) {
            return Keystroke::rejected();
        }

        let mut effects = Vec::new();
        if !self.started {
            self.started = true;
            self.clock.start();
            effects.push(Effect::ClockStarted);
        }
        effects.push(Effect::CaretMoved {
            word_idx: self.current_word,
            caret: self.caret,
        });

        // The race finishes by character completion on the last word; there
        // is no word after it to advance into.
        if self.current_word == self.target_words.len() - 1
            && self.caret == self.current_target_len() as i32 - 1
        {
            let result = build_word_result(&self.typed, &self.target_words[self.current_word]);
            self.word_results.insert(self.current_word, result);
            self.finished = true;
            self.clock.stop();
            effects.push(Effect::Finished);
        }

        Keystroke::accepted(effects)
    }

    fn advance_word(&mut self) -> Keystroke {
        let last = self.target_words.len() - 1;
        if self.typed.trim().is_empty() || self.current_word >= last {
            return Keystroke::rejected();
        }

        let result = build_word_result(&self.typed, &self.target_words[self.current_word]);
        self.word_results.insert(self.current_word, result);
        self.caret = -1;
        // Guard against index overrun: advance only if a next word exists
        if self.working_words.get(self.current_word + 1).is_some() {
            self.current_word += 1;
        }
        self.typed.clear();

        Keystroke::accepted(vec![Effect::CaretMoved {
            word_idx: self.current_word,
            caret: self.caret,
        }])
    }

    fn erase_one(&mut self) -> Keystroke {
        if self.typed.is_empty() {
            return Keystroke::rejected();
        }

        let new_len = self.typed_len() - 1;
        let mut effects = Vec::new();
        if self.caret == new_len as i32 {
            self.caret = (self.caret - 1).max(-1);
            effects.push(Effect::CaretMoved {
                word_idx: self.current_word,
                caret: self.caret,
            });
        }

        // Erasing an overflow character trims the working copy back down
        if new_len >= self.current_target_len() {
            let idx = self.current_word;
            let trimmed: String = self.working_words[idx].chars().take(new_len).collect();
            self.working_words[idx] = trimmed;
        }
        self.typed.pop();

        Keystroke::accepted(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::CharOutcome;
    use assert_matches::assert_matches;

    fn practice(words: &[&str], duration: u64) -> Race {
        Race::new(SessionConfig::new(
            words.iter().map(|w| w.to_string()).collect(),
            duration,
            Mode::Practice,
        ))
    }

    fn multiplayer(words: &[&str], duration: u64) -> Race {
        Race::new(SessionConfig::new(
            words.iter().map(|w| w.to_string()).collect(),
            duration,
            Mode::Multiplayer,
        ))
    }

    fn type_str(race: &mut Race, s: &str) {
        for c in s.chars() {
            race.on_key(Key::Char(c));
        }
    }

    #[test]
    fn test_new_race_initial_state() {
        let race = practice(&["cat", "dog"], 0);
        assert_eq!(race.current_word, 0);
        assert_eq!(race.caret, -1);
        assert_eq!(race.typed, "");
        assert!(race.word_results.is_empty());
        assert!(!race.has_started());
        assert!(!race.has_finished());
    }

    #[test]
    fn test_first_accepted_char_starts_clock_once() {
        let mut race = practice(&["cat", "dog"], 30);
        let stroke = race.on_key(Key::Char('c'));
        assert!(stroke.accepted);
        assert_eq!(stroke.effects[0], Effect::ClockStarted);
        assert!(race.clock.is_running());

        let stroke = race.on_key(Key::Char('a'));
        assert!(!stroke.effects.contains(&Effect::ClockStarted));
    }

    #[test]
    fn test_separator_and_backspace_do_not_start_clock() {
        let mut race = practice(&["cat", "dog"], 30);
        race.on_key(Key::Separator);
        race.on_key(Key::Backspace);
        assert!(!race.has_started());
        assert!(!race.clock.is_running());
    }

    #[test]
    fn test_gated_rejection_does_not_start_clock() {
        let mut race = multiplayer(&["cat"], 30);
        let stroke = race.on_key(Key::Char('x'));
        assert!(!stroke.accepted);
        assert!(!race.has_started());
    }

    #[test]
    fn test_advance_word_stores_result_and_moves_on() {
        let mut race = practice(&["cat", "dog", "owl"], 0);
        type_str(&mut race, "cat");
        let stroke = race.on_key(Key::Separator);

        assert!(stroke.accepted);
        assert_eq!(race.current_word, 1);
        assert_eq!(race.caret, -1);
        assert_eq!(race.typed, "");
        assert_eq!(race.word_results[&0], vec![CharOutcome::Correct; 3]);
        assert_matches!(
            stroke.effects.as_slice(),
            [Effect::CaretMoved {
                word_idx: 1,
                caret: -1
            }]
        );
    }

    #[test]
    fn test_separator_on_blank_buffer_is_noop() {
        let mut race = practice(&["cat", "dog"], 0);
        let stroke = race.on_key(Key::Separator);
        assert!(!stroke.accepted);
        assert_eq!(race.current_word, 0);
        assert!(race.word_results.is_empty());
    }

    #[test]
    fn test_separator_on_last_word_is_noop() {
        let mut race = practice(&["cat", "dog"], 0);
        type_str(&mut race, "cat");
        race.on_key(Key::Separator);
        type_str(&mut race, "do");

        let stroke = race.on_key(Key::Separator);
        assert!(!stroke.accepted);
        assert_eq!(race.current_word, 1);
        assert_eq!(race.typed, "do");
        assert!(!race.word_results.contains_key(&1));
    }

    #[test]
    fn test_finish_by_completing_last_word() {
        let mut race = practice(&["cat", "dog"], 0);
        type_str(&mut race, "cat");
        race.on_key(Key::Separator);
        type_str(&mut race, "do");
        assert!(!race.has_finished());

        let stroke = race.on_key(Key::Char('g'));
        assert!(race.has_finished());
        assert!(!race.clock.is_running());
        assert_eq!(*stroke.effects.last().unwrap(), Effect::Finished);
        // The final word's result is recorded at completion
        assert_eq!(race.word_results[&1], vec![CharOutcome::Correct; 3]);
    }

    #[test]
    fn test_finished_race_ignores_input() {
        let mut race = practice(&["hi"], 0);
        type_str(&mut race, "hi");
        assert!(race.has_finished());

        let caret = race.caret;
        let stroke = race.on_key(Key::Char('x'));
        assert!(!stroke.accepted);
        assert!(stroke.effects.is_empty());
        assert_eq!(race.caret, caret);
    }

    #[test]
    fn test_backspace_on_empty_buffer_is_noop() {
        let mut race = practice(&["cat"], 0);
        let stroke = race.on_key(Key::Backspace);
        assert!(!stroke.accepted);
        assert_eq!(race.caret, -1);
    }

    #[test]
    fn test_backspace_moves_caret_back() {
        let mut race = practice(&["cat"], 0);
        type_str(&mut race, "ca");
        assert_eq!(race.caret, 1);

        race.on_key(Key::Backspace);
        assert_eq!(race.caret, 0);
        assert_eq!(race.typed, "c");

        race.on_key(Key::Backspace);
        assert_eq!(race.caret, -1);
        assert_eq!(race.typed, "");
    }

    #[test]
    fn test_backspace_trims_overflow() {
        let mut race = practice(&["cat"], 0);
        type_str(&mut race, "cats");
        assert_eq!(race.current_working(), "cats");

        race.on_key(Key::Backspace);
        assert_eq!(race.current_working(), "cat");
        assert_eq!(race.typed, "cat");
        assert_eq!(race.caret, 2);
    }

    #[test]
    fn test_completion_invariant_results_precede_current_word() {
        let mut race = practice(&["one", "two", "six"], 0);
        type_str(&mut race, "one");
        race.on_key(Key::Separator);
        type_str(&mut race, "tw");

        let recorded: Vec<usize> = race.word_results.keys().copied().collect();
        assert_eq!(recorded, vec![0]);
        assert!(!race.word_results.contains_key(&race.current_word));
    }

    #[test]
    fn test_countdown_expiry_finishes_race() {
        let mut race = practice(&["hello", "world"], 2);
        type_str(&mut race, "hel");

        assert!(!race.on_tick());
        assert!(race.on_tick());
        assert!(race.has_finished());

        // The latch guarantees expiry is reported only once
        assert!(!race.on_tick());
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut race = practice(&["cat", "dog"], 10);
        type_str(&mut race, "cats");
        race.on_key(Key::Separator);
        race.on_tick();

        race.reset();
        assert_eq!(race.current_word, 0);
        assert_eq!(race.caret, -1);
        assert_eq!(race.typed, "");
        assert!(race.word_results.is_empty());
        assert_eq!(race.working_words, race.target_words);
        assert!(!race.has_started());
        assert!(!race.has_finished());
        assert_eq!(race.clock.seconds_remaining(), Some(10));
    }

    #[test]
    fn test_multiplayer_end_to_end_gating() {
        let mut race = multiplayer(&["hi", "yo"], 0);
        assert!(!race.on_key(Key::Char('x')).accepted);
        assert!(race.on_key(Key::Char('h')).accepted);
        assert!(race.on_key(Key::Char('i')).accepted);
        race.on_key(Key::Separator);
        assert!(race.on_key(Key::Char('y')).accepted);
        let stroke = race.on_key(Key::Char('o'));
        assert!(race.has_finished());
        assert_eq!(*stroke.effects.last().unwrap(), Effect::Finished);
        // Gated typing can never record an incorrect character
        let stats = race.final_stats();
        assert_eq!(stats.incorrect, 0);
        assert_eq!(stats.correct, 4);
    }
}
