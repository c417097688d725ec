use crate::catalog::{ContinentFilter, DEFAULT_ENDPOINT, Difficulty};
use crate::error::DataSourceError;
use crate::game_state::{GameInterface, GameView, UserAction};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;

/// Guess the country from its flag
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a JSON country dataset to use instead of the network
    #[arg(short = 'i', long = "input")]
    pub countries_path: Option<PathBuf>,

    /// Country data endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// HTTP timeout in seconds for country data and flag images
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Use the line-based interface instead of the full-screen one
    #[arg(long)]
    pub plain: bool,

    /// Seed for the country picker
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write the log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}

// UI Input/Output functions

pub enum LineInput {
    Action(UserAction),
    Help,
    Invalid(String),
}

const HELP: &str = "Type a country name to guess, or a command:
  :next                  next country
  :restart               restart the game
  :continent <name>      Choose, All, Africa, Asia, Europe, Americas, Oceania
  :difficulty <1|multi>  1 Word Country or Multiple Words Country
  :quit                  exit";

/// Interprets one line of player input. Anything that is not a command is a guess.
#[must_use]
pub fn parse_line(line: &str) -> LineInput {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return LineInput::Action(UserAction::Guess(trimmed.to_string()));
    };
    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name.to_lowercase().as_str() {
        "next" | "n" => LineInput::Action(UserAction::NextCountry),
        "restart" | "r" => LineInput::Action(UserAction::Restart),
        "quit" | "exit" | "q" => LineInput::Action(UserAction::Exit),
        "help" | "h" => LineInput::Help,
        "continent" | "c" if argument.eq_ignore_ascii_case("choose") => {
            LineInput::Action(UserAction::SelectContinent(None))
        }
        "continent" | "c" => match argument.parse::<ContinentFilter>() {
            Ok(filter) => LineInput::Action(UserAction::SelectContinent(Some(filter))),
            Err(e) => LineInput::Invalid(e),
        },
        "difficulty" | "d" => match argument.parse::<Difficulty>() {
            Ok(difficulty) => LineInput::Action(UserAction::SelectDifficulty(difficulty)),
            Err(e) => LineInput::Invalid(e),
        },
        other => LineInput::Invalid(format!("unknown command ':{other}'")),
    }
}

pub fn read_line_input<R: BufRead>(reader: &mut R) -> LineInput {
    println!("\nYour guess (or :help):");
    let mut input = String::new();
    match reader.read_line(&mut input) {
        Ok(0) => LineInput::Action(UserAction::Exit),
        Ok(_) => parse_line(&input),
        Err(e) => {
            log::warn!("Failed to read input: {e}");
            LineInput::Action(UserAction::Exit)
        }
    }
}

/// Renders a view as plain text lines.
#[must_use]
pub fn render_view(view: &GameView) -> Vec<String> {
    let mut lines = vec![
        "🌍 Guess the Country Flag Game".to_string(),
        format!(
            "Continent: {} | Difficulty: {}",
            view.continent_label(),
            view.difficulty
        ),
    ];
    match &view.round {
        None => lines.push("Please select a continent to start the game.".to_string()),
        Some(round) => {
            if round.flag_image_url.is_empty() {
                lines.push("Flag: (unavailable)".to_string());
            } else {
                lines.push(format!("Flag: {}", round.flag_image_url));
            }
            if let Some(hint) = &round.hint {
                lines.push(format!("Hint: {hint}"));
            }
            if let Some(message) = &view.message {
                lines.push(message.to_string());
            }
            lines.push(format!("🏆 Score: {}", view.score));
        }
    }
    lines
}

pub fn display_view(view: &GameView) {
    for line in render_view(view) {
        println!("{line}");
    }
}

pub fn display_error(error: &DataSourceError) {
    println!("⚠️ Could not load country data: {error}");
}

pub fn display_exit_message() {
    println!("Exiting.");
}

/// CLI implementation of the GameInterface trait
/// This struct wraps a BufRead reader and implements the game interface for CLI interaction
pub struct CliInterface<R: BufRead> {
    reader: R,
}

impl<R: BufRead> CliInterface<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> GameInterface for CliInterface<R> {
    fn read_action(&mut self) -> Option<UserAction> {
        match read_line_input(&mut self.reader) {
            LineInput::Action(action) => Some(action),
            LineInput::Help => {
                println!("{HELP}");
                None
            }
            LineInput::Invalid(reason) => {
                println!("Invalid input: {reason}");
                None
            }
        }
    }

    fn display(&mut self, view: &GameView) {
        display_view(view);
    }

    fn display_error(&mut self, error: &DataSourceError) {
        display_error(error);
    }

    fn display_exit_message(&mut self) {
        display_exit_message();
    }
}
