//! Scoring: accuracy and words-per-minute from accumulated word results,
//! plus the append-only CSV results log.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::outcome::{CharOutcome, WordResult};
use crate::session::Mode;

/// Derived race metrics. Computed once per completion and immutable after;
/// travels on the wire inside finish and leaderboard messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceStats {
    pub accuracy: f64,
    pub wpm: f64,
    pub raw_wpm: f64,
    pub correct: usize,
    pub incorrect: usize,
}

/// Count classified characters across all recorded word results. Untyped
/// positions are excluded from both counts.
pub fn count_characters(word_results: &HashMap<usize, WordResult>) -> (usize, usize) {
    word_results
        .values()
        .flatten()
        .fold((0, 0), |(correct, incorrect), outcome| match outcome {
            CharOutcome::Correct => (correct + 1, incorrect),
            CharOutcome::Incorrect => (correct, incorrect + 1),
            CharOutcome::Untyped => (correct, incorrect),
        })
}

/// Percentage of typed characters that were correct; 0 when nothing typed.
pub fn accuracy(correct: usize, incorrect: usize) -> f64 {
    let total = correct + incorrect;
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

/// Standard 5-characters-per-word convention. 0 when no time has passed,
/// which guards the divide at race start.
pub fn words_per_minute(chars: usize, time_in_minutes: f64) -> f64 {
    if time_in_minutes == 0.0 {
        return 0.0;
    }
    chars as f64 / 5.0 / time_in_minutes
}

/// Compute the final stats for a race. A fixed countdown scores against its
/// configured duration; an open stopwatch scores against elapsed time.
pub fn compute(
    word_results: &HashMap<usize, WordResult>,
    duration_secs: u64,
    elapsed_secs: u64,
) -> RaceStats {
    let (correct, incorrect) = count_characters(word_results);
    let seconds = if duration_secs != 0 {
        duration_secs
    } else {
        elapsed_secs
    };
    let time_in_minutes = seconds as f64 / 60.0;

    RaceStats {
        accuracy: accuracy(correct, incorrect),
        wpm: words_per_minute(correct, time_in_minutes),
        raw_wpm: words_per_minute(correct + incorrect, time_in_minutes),
        correct,
        incorrect,
    }
}

/// One row of the results log.
#[derive(Debug, Serialize)]
struct ResultRecord {
    date: String,
    mode: String,
    num_words: usize,
    duration_secs: u64,
    elapsed_secs: u64,
    wpm: String,
    raw_wpm: String,
    accuracy: String,
}

/// Append-only CSV log of finished races under the project config dir.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "keyrace") {
            pd.config_dir().join("results.csv")
        } else {
            PathBuf::from("keyrace_results.csv")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn append(
        &self,
        stats: &RaceStats,
        mode: Mode,
        num_words: usize,
        duration_secs: u64,
        elapsed_secs: u64,
    ) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_header = !self.path.exists();

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        writer.serialize(ResultRecord {
            date: Local::now().format("%c").to_string(),
            mode: mode.to_string(),
            num_words,
            duration_secs,
            elapsed_secs,
            wpm: format!("{:.2}", stats.wpm),
            raw_wpm: format!("{:.2}", stats.raw_wpm),
            accuracy: format!("{:.1}", stats.accuracy),
        })?;
        writer.flush()?;
        Ok(())
    }
}
