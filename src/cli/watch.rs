//! Watch command implementation - live TUI view of a running replay.

// CLI watch uses intentional casts for display sizing
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use super::{CliError, ModeArg, load_board, load_recording};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use soko::engine::{InputEngine, RenderingEngine};
use soko::game::{Entity, GameState, PlayerId, Position};
use soko::replay::ReplayGame;
use std::collections::VecDeque;
use std::io::{Stdout, stdout};
use std::path::{Path, PathBuf};

/// How many recent messages stay on screen.
const MESSAGE_LOG_LINES: usize = 6;

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if inputs cannot be loaded, the terminal cannot be
/// set up, or the replay hits a contract fault.
pub(crate) fn execute(
    map: &Path,
    actions: &[PathBuf],
    mode: ModeArg,
    fps: u32,
) -> Result<(), CliError> {
    let board = load_board(map)?;
    let mut sources: Vec<Box<dyn InputEngine + Send>> = Vec::with_capacity(actions.len());
    for path in actions {
        sources.push(Box::new(load_recording(path)?));
    }

    let renderer = TuiRenderer::new(mode)?;
    let game = ReplayGame::new(
        mode.into(),
        fps,
        GameState::new(&board),
        sources,
        Box::new(renderer),
    )?;

    // run() joins all threads and drops the renderer, restoring the screen
    let terminal_state = game.run()?;

    println!("{}", super::output::format_summary_text(&terminal_state));
    Ok(())
}

/// A rendering engine that draws frames with ratatui.
///
/// The replay scheduler serializes all calls, so no locking is needed
/// here; the terminal is restored when the renderer is dropped.
struct TuiRenderer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    messages: VecDeque<String>,
    mode: ModeArg,
    frames: u64,
}

impl std::fmt::Debug for TuiRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuiRenderer")
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl TuiRenderer {
    fn new(mode: ModeArg) -> Result<Self, CliError> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(out);
        let terminal = Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))?;
        Ok(Self {
            terminal,
            messages: VecDeque::with_capacity(MESSAGE_LOG_LINES),
            mode,
            frames: 0,
        })
    }
}

impl Drop for TuiRenderer {
    fn drop(&mut self) {
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

impl RenderingEngine for TuiRenderer {
    fn render(&mut self, state: &GameState) {
        self.frames += 1;
        let frames = self.frames;
        let mode = self.mode;
        let messages = &self.messages;
        let _ = self
            .terminal
            .draw(|f| ui(f, state, messages, mode, frames));
    }

    fn message(&mut self, text: &str) {
        if self.messages.len() == MESSAGE_LOG_LINES {
            self.messages.pop_front();
        }
        self.messages.push_back(text.to_string());
    }
}

fn ui(f: &mut Frame, state: &GameState, messages: &VecDeque<String>, mode: ModeArg, frames: u64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                           // Header
            Constraint::Min(state.height() as u16 + 2),      // Board
            Constraint::Length(MESSAGE_LOG_LINES as u16 + 2), // Messages
        ])
        .split(f.area());

    render_header(f, chunks[0], state, mode, frames);
    render_board(f, chunks[1], state);
    render_messages(f, chunks[2], messages);
}

fn render_header(
    f: &mut Frame,
    area: ratatui::layout::Rect,
    state: &GameState,
    mode: ModeArg,
    frames: u64,
) {
    let mode_name = match mode {
        ModeArg::RoundRobin => "round-robin",
        ModeArg::FreeRace => "free-race",
    };
    let quota = state.undo_quota();
    let quota_text = if quota < 0 {
        "unlimited".to_string()
    } else {
        quota.to_string()
    };
    let title = format!(
        " Soko Replay | {mode_name} | Frame {frames} | Undo quota: {quota_text} | Pushes: {} ",
        state.checkpoints()
    );

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn render_board(f: &mut Frame, area: ratatui::layout::Rect, state: &GameState) {
    let visible_width = i32::from(area.width).saturating_sub(2).min(state.width());
    let visible_height = i32::from(area.height).saturating_sub(2).min(state.height());

    let mut lines: Vec<Line> = Vec::new();
    for y in 0..visible_height {
        let mut spans = Vec::new();
        for x in 0..visible_width {
            let position = Position::new(x, y);
            let (glyph, color) = cell_style(state, position);
            spans.push(Span::styled(glyph, Style::default().fg(color)));
        }
        lines.push(Line::from(spans));
    }

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Board "));
    f.render_widget(board, area);
}

fn cell_style(state: &GameState, position: Position) -> (String, Color) {
    match state.entity(position) {
        Entity::Wall => ("#".to_string(), Color::DarkGray),
        Entity::Player(id) => (char::from(b'A' + id).to_string(), player_color(id)),
        Entity::Box(id) => (char::from(b'a' + id).to_string(), player_color(id)),
        Entity::Empty => {
            if state.destinations().contains(&position) {
                ("@".to_string(), Color::Yellow)
            } else {
                (".".to_string(), Color::Gray)
            }
        }
    }
}

fn player_color(id: PlayerId) -> Color {
    match id % 6 {
        0 => Color::Red,
        1 => Color::Blue,
        2 => Color::Green,
        3 => Color::Magenta,
        4 => Color::Cyan,
        _ => Color::LightRed,
    }
}

fn render_messages(f: &mut Frame, area: ratatui::layout::Rect, messages: &VecDeque<String>) {
    let lines: Vec<Line> = messages
        .iter()
        .map(|text| Line::from(text.as_str()))
        .collect();
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(widget, area);
}
