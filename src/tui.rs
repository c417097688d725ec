//! TUI (Terminal User Interface) module for Flag Guesser
//!
//! This module provides an interactive terminal interface using Ratatui.
//!
//! # Layout
//! Title, filter bar, flag, round info (hint, message, score), guess input,
//! status line and key help, top to bottom. The flag is drawn with half-block
//! glyphs, two image pixels per cell.
//!
//! # Input
//! Every key press is turned into at most one `UserAction`. Typing only edits
//! the local guess buffer; the session sees the guess when ENTER is pressed.

use crate::catalog::{ContinentFilter, Difficulty};
use crate::error::DataSourceError;
use crate::flag::{FlagImage, FlagStore};
use crate::game_state::{GameInterface, GameView, UserAction};
use crate::round::{Phase, Severity};
use crate::{debug_log, info_log};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::DynamicImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use reqwest::blocking::Client;
use std::io;

const MAX_GUESS_LENGTH: usize = 60;
const EVENT_POLL_TIMEOUT_MS: u64 = 100;
const ASCII_CONTROL_CHAR_THRESHOLD: u32 = 32;
const HALF_BLOCK: &str = "▀";

// Style constants for consistent UI
const HEADER_STYLE: Style = Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD);
const ERROR_STYLE: Style = Style::new().fg(Color::Red);
const SUCCESS_STYLE: Style = Style::new().fg(Color::Green).add_modifier(Modifier::BOLD);
const WARNING_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const MESSAGE_STYLE: Style = Style::new().fg(Color::Cyan);

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Success => SUCCESS_STYLE,
        Severity::Warning => WARNING_STYLE,
        Severity::Error => ERROR_STYLE,
    }
}

/// What the flag panel can show.
enum FlagPanel<'a> {
    Hidden,
    Loading,
    Unavailable,
    Ready(&'a DynamicImage),
}

/// Context for rendering the UI - groups related parameters to avoid too many function arguments.
struct RenderContext<'a> {
    view: Option<&'a GameView>,
    flag: FlagPanel<'a>,
    current_input: &'a str,
    error_message: &'a str,
    status: &'a str,
}

/// Main TUI interface component.
///
/// Manages terminal rendering, input handling, and flag downloads.
pub struct TuiInterface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    view: Option<GameView>,
    flags: FlagStore,
    current_input: String,
    error_message: String,
    status: String,
}

impl TuiInterface {
    pub fn new(client: Client) -> Result<Self, io::Error> {
        info_log!("TuiInterface::new() - Initializing TUI");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        info_log!("Terminal setup complete: raw mode, alternate screen, cursor hidden");

        Ok(Self {
            terminal,
            view: None,
            flags: FlagStore::new(client),
            current_input: String::new(),
            error_message: String::new(),
            status: "Ready to start".to_string(),
        })
    }

    pub fn cleanup(&mut self) -> Result<(), io::Error> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }

    /// Draw the current UI state to the terminal.
    ///
    /// Never downloads; a flag that has not been fetched yet shows as loading.
    fn draw(&mut self) -> Result<(), io::Error> {
        let flag = match self.view.as_ref().and_then(|v| v.round.as_ref()) {
            None => FlagPanel::Hidden,
            Some(round) => match self.flags.peek(&round.flag_image_url) {
                _ if round.flag_image_url.is_empty() => FlagPanel::Unavailable,
                None => FlagPanel::Loading,
                Some(None) => FlagPanel::Unavailable,
                Some(Some(image)) => FlagPanel::Ready(image),
            },
        };
        let ctx = RenderContext {
            view: self.view.as_ref(),
            flag,
            current_input: &self.current_input,
            error_message: &self.error_message,
            status: &self.status,
        };

        self.terminal.draw(|f| {
            Self::render_static(f, &ctx);
        })?;
        Ok(())
    }

    /// Log and handle draw errors appropriately
    fn draw_or_log(&mut self) {
        if let Err(e) = self.draw() {
            debug_log!("Draw error: {}", e);
        }
    }

    /// Render the complete UI layout using the provided context.
    fn render_static(f: &mut Frame, ctx: &RenderContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Filters
                Constraint::Min(8),    // Flag (takes remaining space)
                Constraint::Length(5), // Hint, message, score
                Constraint::Length(3), // Guess input
                Constraint::Length(3), // Status line
                Constraint::Length(3), // Instructions
            ])
            .split(f.area());

        Self::render_title(f, chunks[0]);
        Self::render_filters(f, chunks[1], ctx.view);
        Self::render_flag(f, chunks[2], &ctx.flag);
        Self::render_info(f, chunks[3], ctx.view, ctx.error_message);
        Self::render_input(f, chunks[4], ctx.current_input);
        Self::render_status(f, chunks[5], ctx.status);
        Self::render_instructions(f, chunks[6]);
    }

    fn render_title(f: &mut Frame, area: Rect) {
        let title = Paragraph::new("🌍 GUESS THE COUNTRY FLAG")
            .style(HEADER_STYLE)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn render_filters(f: &mut Frame, area: Rect, view: Option<&GameView>) {
        let (continent, difficulty) = view.map_or(("Choose", "1 Word Country"), |v| {
            (v.continent_label(), v.difficulty.label())
        });
        let line = Line::from(vec![
            Span::raw("Continent: "),
            Span::styled(continent, WARNING_STYLE),
            Span::raw("    Difficulty: "),
            Span::styled(difficulty, WARNING_STYLE),
        ]);
        let paragraph =
            Paragraph::new(line).block(Block::default().title("Filters").borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_flag(f: &mut Frame, area: Rect, flag: &FlagPanel) {
        let block = Block::default().title("Flag").borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let lines = match flag {
            FlagPanel::Hidden => vec![Line::from(Span::styled(
                "Please select a continent to start the game.",
                MESSAGE_STYLE,
            ))],
            FlagPanel::Loading => vec![Line::from("Loading flag...")],
            FlagPanel::Unavailable => vec![Line::from(Span::styled("(flag unavailable)", ERROR_STYLE))],
            FlagPanel::Ready(image) => Self::flag_lines(&FlagImage::fit(image, inner.width, inner.height)),
        };
        f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn flag_lines(flag: &FlagImage) -> Vec<Line<'static>> {
        flag.row_cells()
            .map(|row| {
                let spans: Vec<Span> = row
                    .iter()
                    .map(|([ur, ug, ub], [lr, lg, lb])| {
                        Span::styled(
                            HALF_BLOCK,
                            Style::default()
                                .fg(Color::Rgb(*ur, *ug, *ub))
                                .bg(Color::Rgb(*lr, *lg, *lb)),
                        )
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }

    fn render_info(f: &mut Frame, area: Rect, view: Option<&GameView>, error_message: &str) {
        let mut lines = Vec::new();

        if let Some(view) = view
            && let Some(round) = &view.round
        {
            if let Some(hint) = &round.hint {
                lines.push(Line::from(format!("Hint: {hint}")));
            }
            if let Some(message) = &view.message {
                lines.push(Line::from(Span::styled(
                    message.to_string(),
                    severity_style(message.severity()),
                )));
            }
            lines.push(Line::from(Span::styled(
                format!("🏆 Score: {}", view.score),
                HEADER_STYLE,
            )));
        }

        // Error messages
        if !error_message.is_empty() {
            lines.push(Line::from(vec![Span::styled(error_message, ERROR_STYLE)]));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Round").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_input(f: &mut Frame, area: Rect, current_input: &str) {
        let line = Line::from(vec![
            Span::raw(current_input.to_string()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().title("Guess the country").borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_instructions(f: &mut Frame, area: Rect) {
        let text = "ENTER: Guess | TAB: Continent | F2: Difficulty | F5: Next Country | F8: Restart | ESC: Quit";
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_status(f: &mut Frame, area: Rect, status: &str) {
        let status_text = if status.is_empty() { "Ready" } else { status };
        let paragraph = Paragraph::new(status_text)
            .style(HEADER_STYLE)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        f.render_widget(paragraph, area);
    }

    fn handle_input(&mut self) -> Result<Option<UserAction>, io::Error> {
        // Poll with a timeout to check if events are available
        if !event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            return Ok(None);
        }

        let event = event::read()?;
        match event {
            Event::Key(key) => {
                // Only process Press events, ignore Release and Repeat to avoid double input
                if key.kind != event::KeyEventKind::Press {
                    return Ok(None);
                }
                // Filter out garbage from terminal focus escape sequences (alt-tab)
                if let KeyCode::Char(c) = key.code
                    && (c == '\u{FFFD}' || (c as u32) < ASCII_CONTROL_CHAR_THRESHOLD)
                {
                    debug_log!("handle_input() - Ignoring invalid character: {:?}", c);
                    return Ok(None);
                }
                debug_log!(
                    "handle_input() - Key event received: code={:?}, modifiers={:?}",
                    key.code,
                    key.modifiers
                );
                Ok(self.handle_key(key))
            }
            // Redraw happens on the next loop iteration anyway
            Event::Resize(_, _) => Ok(None),
            other => {
                debug_log!("handle_input() - Ignoring event: {:?}", other);
                Ok(None)
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<UserAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => Some(UserAction::Exit),
            KeyCode::Tab => Some(UserAction::SelectContinent(ContinentFilter::cycle(
                self.current_continent(),
            ))),
            KeyCode::BackTab | KeyCode::F(2) => {
                Some(UserAction::SelectDifficulty(self.current_difficulty().toggle()))
            }
            KeyCode::F(5) => Some(UserAction::NextCountry),
            KeyCode::Char('n' | 'N') if ctrl => Some(UserAction::NextCountry),
            KeyCode::F(8) => Some(UserAction::Restart),
            KeyCode::Char('r' | 'R') if ctrl => Some(UserAction::Restart),
            KeyCode::Enter => {
                let guess = std::mem::take(&mut self.current_input);
                info_log!("handle_key() - Submitting guess: '{}'", guess);
                Some(UserAction::Guess(guess))
            }
            KeyCode::Backspace => {
                self.current_input.pop();
                None
            }
            KeyCode::Char(c)
                if !ctrl && !alt && self.current_input.chars().count() < MAX_GUESS_LENGTH =>
            {
                self.error_message.clear();
                self.current_input.push(c);
                None
            }
            _ => {
                debug_log!("handle_key() - Ignoring key: {:?}", key.code);
                None
            }
        }
    }

    fn current_continent(&self) -> Option<ContinentFilter> {
        self.view.as_ref().and_then(|v| v.continent)
    }

    fn current_difficulty(&self) -> Difficulty {
        self.view.as_ref().map(|v| v.difficulty).unwrap_or_default()
    }

    fn status_for(view: &GameView) -> String {
        match &view.round {
            None => "Choose a continent with TAB to start".to_string(),
            Some(round) => match round.phase {
                Phase::AwaitingFirstGuess => "Guess the country - first attempt".to_string(),
                Phase::AwaitingSecondGuess => "One more attempt for half a point".to_string(),
                Phase::Resolved => "Round over - F5 for the next country".to_string(),
            },
        }
    }
}

impl GameInterface for TuiInterface {
    fn read_action(&mut self) -> Option<UserAction> {
        loop {
            if self.draw().is_err() {
                info_log!("read_action() - Draw failed, returning Exit");
                return Some(UserAction::Exit);
            }
            match self.handle_input() {
                Ok(Some(action)) => {
                    info_log!("read_action() - Action received: {:?}", action);
                    return Some(action);
                }
                Ok(None) => {}
                Err(_e) => {
                    info_log!("read_action() - Error handling input, returning Exit");
                    return Some(UserAction::Exit);
                }
            }
        }
    }

    fn display(&mut self, view: &GameView) {
        self.status = Self::status_for(view);
        let pending_flag = view
            .round
            .as_ref()
            .map(|r| r.flag_image_url.clone())
            .filter(|url| !url.is_empty() && self.flags.peek(url).is_none());
        if view.round.is_some() {
            self.error_message.clear();
        }
        self.view = Some(view.clone());

        if let Some(url) = pending_flag {
            self.draw_or_log();
            // Blocks until the download finishes or times out.
            let _ = self.flags.get(&url);
        }
        self.draw_or_log();
    }

    fn display_error(&mut self, error: &DataSourceError) {
        self.error_message = format!("⚠️ Could not load country data: {error}");
        self.draw_or_log();
    }

    fn display_exit_message(&mut self) {
        self.status = "Exiting...".to_string();
        self.draw_or_log();
    }
}

impl Drop for TuiInterface {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
