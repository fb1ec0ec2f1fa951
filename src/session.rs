use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::metrics::{DerivedMetrics, MetricsCalculator, MetricsDisplay};
use crate::runtime::{EventSource, FixedTicker, HostEvent, Runner, Ticker};
use crate::scoring::{AggregateCounters, Cursor, LetterStats, ScoredWord, ScoringEngine, WordResult};
use crate::summary::{SessionEnd, Summary, SummaryBuilder};
use crate::text_source::{DefaultTextSource, TargetText, TextSource, TextSourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Idle,
    AwaitingFirstKey,
    Running,
    Finished,
    Terminated,
    ShowingSummary,
    Reset,
}

/// Discrete input delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    AnyKey,
    /// A character typed into the entry buffer.
    Char(char),
    Backspace,
    /// Submit and clear the entry buffer.
    SubmitEntry,
    SubmitWord(String),
    AbortHard,
    /// Ends the run early but keeps the summary.
    AbortSoft,
    CloseSummary,
    WindowClosed,
}

impl InputEvent {
    fn is_key(&self) -> bool {
        matches!(
            self,
            InputEvent::AnyKey
                | InputEvent::Char(_)
                | InputEvent::Backspace
                | InputEvent::SubmitEntry
                | InputEvent::SubmitWord(_)
        )
    }

    fn is_abort(&self) -> bool {
        matches!(
            self,
            InputEvent::AbortHard | InputEvent::AbortSoft | InputEvent::WindowClosed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub display_time: bool,
    pub display_precision: bool,
    pub display_chars_per_minute: bool,
    pub display_words_per_minute: bool,
    pub display_final_graph: bool,
    pub update_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            display_time: true,
            display_precision: true,
            display_chars_per_minute: true,
            display_words_per_minute: true,
            display_final_graph: true,
            update_delay: Duration::from_millis(5),
        }
    }
}

impl SessionConfig {
    pub fn display_stats(&self) -> bool {
        self.display_time
            || self.display_precision
            || self.display_chars_per_minute
            || self.display_words_per_minute
    }

    pub fn display_summary(&self) -> bool {
        self.display_stats() || self.display_final_graph
    }
}

/// Receives everything a front end needs to draw a session.
pub trait RenderSink {
    fn on_transition(&mut self, _from: SessionState, _to: SessionState, _text: &TargetText) {}
    fn on_entry(&mut self, _entry: &str) {}
    fn on_word(&mut self, _scored: &ScoredWord) {}
    fn on_metrics(&mut self, _metrics: &DerivedMetrics, _display: &MetricsDisplay) {}
    fn on_summary(&mut self, _summary: &Summary) {}
    fn redraw(&mut self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {}

/// One typing test, reusable from idle to idle.
pub struct Session {
    config: SessionConfig,
    source: Box<dyn TextSource>,
    text: TargetText,
    state: SessionState,
    cursor: Cursor,
    scoring: ScoringEngine,
    entry: String,
    started_at: Option<Instant>,
    metrics: DerivedMetrics,
    display: MetricsDisplay,
    summary_suppressed: bool,
    summary: Option<Summary>,
}

impl Session {
    pub fn new(config: SessionConfig, source: impl TextSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
            text: TargetText::default(),
            state: SessionState::Idle,
            cursor: Cursor::default(),
            scoring: ScoringEngine::new(),
            entry: String::new(),
            started_at: None,
            metrics: DerivedMetrics::default(),
            display: MetricsDisplay::default(),
            summary_suppressed: false,
            summary: None,
        }
    }

    /// Takes effect on the next run.
    pub fn set_text_source(&mut self, source: impl TextSource + 'static) {
        self.source = Box::new(source);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn text(&self) -> &TargetText {
        &self.text
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn counters(&self) -> AggregateCounters {
        self.scoring.counters()
    }

    pub fn letter_stats(&self) -> &LetterStats {
        self.scoring.letter_stats()
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    pub fn display(&self) -> &MetricsDisplay {
        &self.display
    }

    /// The summary on screen, if any.
    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn ticker(&self) -> FixedTicker {
        FixedTicker::new(self.config.update_delay)
    }

    /// Run one whole session, blocking until it is idle again.
    pub fn start<E: EventSource, T: Ticker>(
        &mut self,
        runner: &Runner<E, T>,
        sink: &mut dyn RenderSink,
    ) -> Result<(), TextSourceError> {
        self.begin(sink)?;

        while self.state != SessionState::Idle {
            let event = runner.step();
            let now = Instant::now();
            match event {
                HostEvent::Tick => {}
                HostEvent::Resize => sink.redraw(),
                HostEvent::Input(input) => self.handle_event(input, now, sink),
            }
            self.tick(now, sink);
        }

        Ok(())
    }

    /// Load the text and wait for the first key.
    pub fn begin(&mut self, sink: &mut dyn RenderSink) -> Result<(), TextSourceError> {
        if self.state != SessionState::Idle {
            tracing::warn!(state = %self.state, "begin called on a session that is not idle");
            return Ok(());
        }

        self.text = TargetText::load(self.source.as_ref())?;
        self.cursor = Cursor::default();
        info!(
            source = %self.source.describe(),
            words = self.text.len(),
            "session ready"
        );

        self.transition(SessionState::AwaitingFirstKey, sink);
        sink.on_entry(&self.entry);
        Ok(())
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant, sink: &mut dyn RenderSink) {
        match self.state {
            SessionState::AwaitingFirstKey | SessionState::Running if event.is_abort() => {
                self.terminate(&event, now, sink);
            }
            SessionState::AwaitingFirstKey if event.is_key() => {
                self.started_at = Some(now);
                self.transition(SessionState::Running, sink);
                self.apply_key(event, now, sink);
            }
            SessionState::Running if event.is_key() => self.apply_key(event, now, sink),
            SessionState::ShowingSummary
                if matches!(
                    event,
                    InputEvent::CloseSummary | InputEvent::AbortHard | InputEvent::WindowClosed
                ) =>
            {
                self.reset(sink);
            }
            state => trace!(?event, %state, "ignoring event"),
        }
    }

    /// Refresh the live metrics. Only does work while running.
    pub fn tick(&mut self, now: Instant, sink: &mut dyn RenderSink) {
        if self.state != SessionState::Running {
            return;
        }
        if let Some(start) = self.started_at {
            self.refresh_metrics(start, now, sink);
        }
    }

    fn apply_key(&mut self, event: InputEvent, now: Instant, sink: &mut dyn RenderSink) {
        match event {
            InputEvent::Char(c) => {
                self.entry.push(c);
                sink.on_entry(&self.entry);
            }
            InputEvent::Backspace => {
                self.entry.pop();
                sink.on_entry(&self.entry);
            }
            InputEvent::SubmitEntry => {
                let typed = mem::take(&mut self.entry);
                sink.on_entry(&self.entry);
                self.submit(&typed, now, sink);
            }
            InputEvent::SubmitWord(typed) => self.submit(&typed, now, sink),
            _ => {}
        }
    }

    fn submit(&mut self, typed: &str, now: Instant, sink: &mut dyn RenderSink) {
        match self.scoring.submit_word(&self.text, &mut self.cursor, typed) {
            WordResult::Ignored => trace!("ignoring blank submission"),
            WordResult::Scored(scored) => {
                sink.on_word(&scored);
                if scored.finished {
                    self.end(SessionEnd::Finished, now, sink);
                }
            }
        }
    }

    fn terminate(&mut self, event: &InputEvent, now: Instant, sink: &mut dyn RenderSink) {
        if *event != InputEvent::AbortSoft {
            self.summary_suppressed = true;
        }
        self.end(SessionEnd::Terminated, now, sink);
    }

    fn end(&mut self, ended: SessionEnd, now: Instant, sink: &mut dyn RenderSink) {
        if let Some(start) = self.started_at {
            self.refresh_metrics(start, now, sink);
        }
        self.transition(
            match ended {
                SessionEnd::Finished => SessionState::Finished,
                SessionEnd::Terminated => SessionState::Terminated,
            },
            sink,
        );

        let counters = self.counters();
        info!(
            %ended,
            correct = counters.correct_chars,
            total = counters.total_chars,
            words = counters.words_completed,
            elapsed = self.metrics.elapsed_secs,
            "session ended"
        );

        // graph suppression is per run; the configured default is untouched
        let show_graph =
            self.config.display_final_graph && SummaryBuilder::has_graph_data(self.letter_stats());
        let show_stats = self.config.display_stats();

        if (show_stats || show_graph) && !self.summary_suppressed {
            let summary = Summary {
                ended,
                counters,
                metrics: self.metrics,
                display: self.display.clone(),
                show_stats,
                accuracy_by_char: show_graph
                    .then(|| SummaryBuilder::accuracy_by_char(self.letter_stats())),
            };
            sink.on_summary(&summary);
            self.summary = Some(summary);
            self.transition(SessionState::ShowingSummary, sink);
        } else {
            self.reset(sink);
        }
    }

    fn reset(&mut self, sink: &mut dyn RenderSink) {
        self.transition(SessionState::Reset, sink);

        self.scoring.reset();
        self.cursor = Cursor::default();
        self.entry.clear();
        self.started_at = None;
        self.metrics = DerivedMetrics::default();
        self.display = MetricsDisplay::default();
        self.summary_suppressed = false;
        self.summary = None;
        sink.on_entry(&self.entry);
        sink.on_metrics(&self.metrics, &self.display);

        self.transition(SessionState::Idle, sink);
    }

    fn refresh_metrics(&mut self, start: Instant, now: Instant, sink: &mut dyn RenderSink) {
        let counters = self.counters();
        let metrics = MetricsCalculator::tick(now, start, &counters, &self.metrics);
        if metrics != self.metrics {
            self.metrics = metrics;
            self.display = MetricsDisplay::from(&metrics);
            sink.on_metrics(&self.metrics, &self.display);
        }
    }

    fn transition(&mut self, to: SessionState, sink: &mut dyn RenderSink) {
        let from = mem::replace(&mut self.state, to);
        debug!(%from, %to, "session transition");
        sink.on_transition(from, to, &self.text);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default(), DefaultTextSource)
    }
}
