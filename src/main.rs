use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor::MoveTo,
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use itertools::Itertools;
use std::{
    error::Error,
    io::{self, stdin, Write},
};

use keyrace::{
    config::{Config, ConfigStore, FileConfigStore},
    outcome::CharOutcome,
    race::{Key, Race},
    runtime::{CrosstermEventSource, FixedTicker, RaceEvent, Runner},
    session::{Mode, SessionConfig},
    stats::ResultsLog,
    words::sample_words,
};

/// competitive typing race: practice against the clock in your terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing race for your terminal. Type the target words as fast as you can; \
finish the sequence or run out the clock to see accuracy, wpm and raw wpm."
)]
pub struct Cli {
    /// number of words to race through
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// race duration in seconds (0 = open stopwatch)
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// custom space-separated word sequence to race on
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// shuffle the built-in word list
    #[clap(long)]
    shuffle: bool,

    /// character-gated input: only the next required character is accepted
    /// (the multiplayer input policy, useful as a no-errors drill)
    #[clap(long)]
    gated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub cli: Cli,
    pub race: Race,
    pub state: AppState,
    player_name: String,
    number_of_words: usize,
    duration_secs: u64,
    shuffle: bool,
}

impl App {
    /// Resolve CLI arguments against stored settings. Exits with a usage
    /// error when the resolved word sequence is empty; this runs before raw
    /// mode is enabled.
    pub fn new(cli: Cli, stored: Config) -> Self {
        let number_of_words = cli.number_of_words.unwrap_or(stored.number_of_words);
        let duration_secs = cli.seconds.unwrap_or(stored.duration_secs);
        let shuffle = cli.shuffle || stored.shuffle_words;
        let words = match Self::validated_words(&cli, number_of_words, shuffle) {
            Ok(words) => words,
            Err(msg) => Cli::command().error(ErrorKind::InvalidValue, msg).exit(),
        };
        let mode = if cli.gated {
            Mode::Multiplayer
        } else {
            Mode::Practice
        };

        Self {
            race: Race::new(SessionConfig::new(words, duration_secs, mode)),
            cli,
            state: AppState::Typing,
            player_name: stored.player_name,
            number_of_words,
            duration_secs,
            shuffle,
        }
    }

    fn pick_words(cli: &Cli, number_of_words: usize, shuffle: bool) -> Vec<String> {
        match &cli.prompt {
            Some(prompt) => prompt.split_whitespace().map(|w| w.to_string()).collect(),
            None => sample_words(number_of_words, shuffle),
        }
    }

    /// A race needs at least one target word; `-w 0` or a blank `-p` would
    /// otherwise panic the engine on the first keystroke.
    fn validated_words(
        cli: &Cli,
        number_of_words: usize,
        shuffle: bool,
    ) -> Result<Vec<String>, String> {
        let words = Self::pick_words(cli, number_of_words, shuffle);
        if words.is_empty() {
            return Err("need at least one word to race on".to_string());
        }
        Ok(words)
    }

    /// The settings this session resolved to, persisted as the new defaults.
    pub fn effective_config(&self) -> Config {
        Config {
            player_name: self.player_name.clone(),
            number_of_words: self.number_of_words,
            duration_secs: self.duration_secs,
            shuffle_words: self.shuffle,
        }
    }

    /// Restart on the same words.
    pub fn restart(&mut self) {
        self.race.reset();
        self.state = AppState::Typing;
    }

    /// Start over on a freshly picked word sequence.
    pub fn new_race(&mut self) {
        // The word source was validated in new(); the same inputs cannot
        // produce an empty sequence here.
        let words = Self::pick_words(&self.cli, self.number_of_words, self.shuffle);
        let mode = self.race.mode;
        self.race = Race::new(SessionConfig::new(words, self.duration_secs, mode));
        self.state = AppState::Typing;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let mut app = App::new(cli, store.load());
    let _ = store.save(&app.effective_config());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = run(&mut stdout, &mut app);

    disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;
    result
}

fn run(stdout: &mut io::Stdout, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let runner = Runner::new(events, FixedTicker::default());
    let results_log = ResultsLog::new();

    draw(stdout, app)?;

    loop {
        match runner.step() {
            RaceEvent::Tick => {
                if app.state == AppState::Typing && app.race.has_started() {
                    if app.race.on_tick() {
                        finish(app, &results_log);
                    }
                    draw(stdout, app)?;
                }
            }
            RaceEvent::Resize => {
                draw(stdout, app)?;
            }
            RaceEvent::Net(_) => {
                // The practice binary runs without a relay connection.
            }
            RaceEvent::Key(key) => {
                if is_quit(&key) {
                    break;
                }
                match app.state {
                    AppState::Typing => {
                        if let Some(race_key) = to_race_key(&key) {
                            app.race.on_key(race_key);
                            if app.race.has_finished() {
                                finish(app, &results_log);
                            }
                        } else if key.code == KeyCode::Left {
                            app.restart();
                        }
                    }
                    AppState::Results => match key.code {
                        KeyCode::Char('r') => app.restart(),
                        KeyCode::Char('n') => app.new_race(),
                        _ => {}
                    },
                }
                draw(stdout, app)?;
            }
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

/// Map a terminal key to a race key, dropping navigation/modifier keys.
fn to_race_key(key: &KeyEvent) -> Option<Key> {
    match key.code {
        KeyCode::Char(' ') => Some(Key::Separator),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Char(c)),
        _ => None,
    }
}

fn finish(app: &mut App, log: &ResultsLog) {
    let stats = app.race.final_stats();
    let _ = log.append(
        &stats,
        app.race.mode,
        app.race.target_words.len(),
        app.race.clock.duration_secs(),
        app.race.clock.seconds_elapsed(),
    );
    app.state = AppState::Results;
}

fn draw(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0), ResetColor)?;
    match app.state {
        AppState::Typing => draw_race(stdout, &app.race)?,
        AppState::Results => draw_results(stdout, app)?,
    }
    stdout.flush()
}

fn draw_race(stdout: &mut io::Stdout, race: &Race) -> io::Result<()> {
    let timer = match race.clock.seconds_remaining() {
        Some(remaining) => format!("{}", remaining),
        None => format!("{}", race.clock.seconds_elapsed()),
    };
    queue!(
        stdout,
        SetForegroundColor(Color::Yellow),
        Print(timer),
        ResetColor,
        MoveTo(0, 2)
    )?;

    let typed: Vec<char> = race.typed.chars().collect();
    for (word_idx, word) in race.working_words.iter().enumerate() {
        let working: Vec<char> = word.chars().collect();
        let target_len = race.target_words[word_idx].chars().count();
        for (char_idx, c) in working.iter().enumerate() {
            let color = if word_idx < race.current_word {
                match race
                    .word_results
                    .get(&word_idx)
                    .and_then(|r| r.get(char_idx).copied())
                {
                    Some(CharOutcome::Correct) => Color::White,
                    Some(CharOutcome::Incorrect) => Color::Red,
                    _ => Color::DarkGrey,
                }
            } else if word_idx == race.current_word {
                if char_idx >= target_len {
                    // overflow characters are always incorrect
                    Color::Red
                } else if char_idx < typed.len() {
                    if typed[char_idx] == *c {
                        Color::White
                    } else {
                        Color::Red
                    }
                } else {
                    Color::DarkGrey
                }
            } else {
                Color::DarkGrey
            };

            let at_caret =
                word_idx == race.current_word && char_idx as i32 == race.caret + 1;
            if at_caret {
                queue!(stdout, SetAttribute(Attribute::Underlined))?;
            }
            queue!(stdout, SetForegroundColor(color), Print(c))?;
            if at_caret {
                queue!(stdout, SetAttribute(Attribute::NoUnderline))?;
            }
        }
        queue!(stdout, ResetColor, Print(' '))?;
    }
    Ok(())
}

fn draw_results(stdout: &mut io::Stdout, app: &App) -> io::Result<()> {
    let stats = app.race.final_stats();
    let lines = [
        format!("results for {}", app.player_name),
        format!("wpm: {:.1}", stats.wpm),
        format!("raw wpm: {:.1}", stats.raw_wpm),
        format!("accuracy: {:.1}%", stats.accuracy),
        format!(
            "characters: {} correct / {} incorrect",
            stats.correct, stats.incorrect
        ),
        String::new(),
        "(r)etry / (n)ew words / esc to quit".to_string(),
    ];
    let body = lines.iter().join("\r\n");
    queue!(stdout, Print(body))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["keyrace"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_zero_word_count_is_rejected() {
        let cli = cli(&["-w", "0"]);
        assert!(App::validated_words(&cli, 0, false).is_err());
    }

    #[test]
    fn test_blank_prompt_is_rejected() {
        let cli = cli(&["-p", "   "]);
        assert!(App::validated_words(&cli, 15, false).is_err());
    }

    #[test]
    fn test_normal_word_sources_are_accepted() {
        let words = App::validated_words(&cli(&[]), 15, false).unwrap();
        assert_eq!(words.len(), 15);

        let words = App::validated_words(&cli(&["-p", "the quick fox"]), 15, false).unwrap();
        assert_eq!(words, vec!["the", "quick", "fox"]);
    }

    #[test]
    fn test_stored_settings_fill_in_cli_gaps() {
        let stored = Config {
            player_name: "alice".into(),
            number_of_words: 7,
            duration_secs: 60,
            shuffle_words: true,
        };
        let app = App::new(cli(&[]), stored);

        assert_eq!(app.race.target_words.len(), 7);
        assert_eq!(app.race.clock.duration_secs(), 60);
        assert!(app.shuffle);
        assert_eq!(app.effective_config().player_name, "alice");
    }

    #[test]
    fn test_cli_flags_override_stored_settings() {
        let stored = Config {
            duration_secs: 60,
            ..Config::default()
        };
        let app = App::new(cli(&["-s", "0", "-w", "3"]), stored);

        assert_eq!(app.race.clock.duration_secs(), 0);
        assert_eq!(app.race.target_words.len(), 3);
        // The resolved settings become the new defaults
        assert_eq!(app.effective_config().duration_secs, 0);
        assert_eq!(app.effective_config().number_of_words, 3);
    }
}
