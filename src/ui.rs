pub mod charting;
pub mod screen;

use std::str::FromStr;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
    Terminal,
};

use crate::config::StyleConfig;
use crate::metrics::{DerivedMetrics, MetricsDisplay};
use crate::scoring::{Outcome, ScoredWord};
use crate::session::{RenderSink, SessionConfig, SessionState};
use crate::summary::Summary;
use crate::text_source::TargetText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharTag {
    Pending,
    Current,
    Correct,
    Incorrect,
}

/// Colours resolved from [`StyleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Color,
    pub current: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub stats: Color,
    pub bars: [Color; 2],
}

fn parse_color(name: &str, fallback: Color) -> Color {
    Color::from_str(name).unwrap_or_else(|_| {
        tracing::warn!(color = name, "unknown colour name");
        fallback
    })
}

impl From<&StyleConfig> for Palette {
    fn from(style: &StyleConfig) -> Self {
        Self {
            text: parse_color(&style.text, Color::White),
            current: parse_color(&style.current, Color::White),
            correct: parse_color(&style.correct, Color::Green),
            incorrect: parse_color(&style.incorrect, Color::Red),
            stats: parse_color(&style.stats, Color::Blue),
            bars: [
                parse_color(&style.bars[0], Color::Blue),
                parse_color(&style.bars[1], Color::Rgb(255, 165, 0)),
            ],
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from(&StyleConfig::default())
    }
}

/// What the terminal shows, kept in sync by [`TerminalSink`].
#[derive(Debug, Clone)]
pub struct Board {
    pub state: SessionState,
    pub chars: Vec<char>,
    pub tags: Vec<CharTag>,
    pub entry: String,
    pub display: MetricsDisplay,
    pub summary: Option<Summary>,
    pub config: SessionConfig,
    pub palette: Palette,
}

impl Board {
    pub fn new(config: SessionConfig, palette: Palette) -> Self {
        Self {
            state: SessionState::Idle,
            chars: vec![],
            tags: vec![],
            entry: String::new(),
            display: MetricsDisplay::default(),
            summary: None,
            config,
            palette,
        }
    }

    pub fn load_text(&mut self, text: &TargetText) {
        self.chars = text.rendered().chars().collect();
        self.tags = vec![CharTag::Pending; self.chars.len()];
        self.mark_current_from(0);
    }

    pub fn apply_word(&mut self, scored: &ScoredWord) {
        for mark in &scored.marks {
            if let Some(tag) = self.tags.get_mut(mark.offset) {
                *tag = match mark.outcome {
                    Outcome::Correct => CharTag::Correct,
                    Outcome::Incorrect => CharTag::Incorrect,
                };
            }
        }
        if !scored.finished {
            self.mark_current_from(scored.char_offset + scored.marks.len() + 1);
        }
    }

    fn mark_current_from(&mut self, start: usize) {
        for (c, tag) in self.chars.iter().zip(self.tags.iter_mut()).skip(start) {
            if *c == ' ' {
                break;
            }
            *tag = CharTag::Current;
        }
    }
}

impl Widget for &Board {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(self.state).render(self, area, buf);
    }
}

/// Draws every session update to a ratatui terminal.
pub struct TerminalSink<B: Backend> {
    terminal: Terminal<B>,
    board: Board,
}

impl<B: Backend> TerminalSink<B> {
    pub fn new(terminal: Terminal<B>, board: Board) -> Self {
        Self { terminal, board }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn draw(&mut self) {
        let Self { terminal, board } = self;
        if let Err(e) = terminal.draw(|f| f.render_widget(&*board, f.area())) {
            tracing::warn!(error = %e, "failed to draw frame");
        }
    }
}

impl<B: Backend> RenderSink for TerminalSink<B> {
    fn on_transition(&mut self, _from: SessionState, to: SessionState, text: &TargetText) {
        self.board.state = to;
        match to {
            SessionState::AwaitingFirstKey => self.board.load_text(text),
            SessionState::Idle => self.board.summary = None,
            _ => {}
        }
        self.draw();
    }

    fn on_entry(&mut self, entry: &str) {
        self.board.entry = entry.to_string();
        self.draw();
    }

    fn on_word(&mut self, scored: &ScoredWord) {
        self.board.apply_word(scored);
        self.draw();
    }

    fn on_metrics(&mut self, _metrics: &DerivedMetrics, display: &MetricsDisplay) {
        self.board.display = display.clone();
        self.draw();
    }

    fn on_summary(&mut self, summary: &Summary) {
        self.board.summary = Some(summary.clone());
    }

    fn redraw(&mut self) {
        self.draw();
    }
}
