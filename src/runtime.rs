use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode,
};

use crate::session::InputEvent;

/// Unified event type consumed by the session loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Input(InputEvent),
    Resize,
    Tick,
}

/// Map a terminal key press onto a session input.
pub fn translate_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let event = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputEvent::WindowClosed
        }
        KeyCode::Esc => InputEvent::AbortHard,
        KeyCode::Enter | KeyCode::Modifier(ModifierKeyCode::LeftControl) => InputEvent::AbortSoft,
        KeyCode::Char(' ') => InputEvent::SubmitEntry,
        KeyCode::Char(c) => InputEvent::Char(c),
        KeyCode::Backspace => InputEvent::Backspace,
        _ => InputEvent::AnyKey,
    };
    Some(event)
}

/// Source of host events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<HostEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(CtEvent::Key(key)) => translate_key(key).map(HostEvent::Input),
                Ok(CtEvent::Resize(_, _)) => Some(HostEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::error!(error = %e, "terminal input failed");
                    break;
                }
            };

            if let Some(event) = event {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<HostEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<HostEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<HostEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances a session one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout.
    /// A closed source reads as the window being closed.
    pub fn step(&self) -> HostEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => HostEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => HostEvent::Input(InputEvent::WindowClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use std::sync::mpsc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), HostEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(HostEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        assert_eq!(runner.step(), HostEvent::Resize);
    }

    #[test]
    fn step_reports_window_closed_on_disconnect() {
        let (tx, rx) = mpsc::channel::<HostEvent>();
        drop(tx);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert_eq!(runner.step(), HostEvent::Input(InputEvent::WindowClosed));
    }

    #[test]
    fn translate_typing_keys() {
        assert_eq!(
            translate_key(press(KeyCode::Char('a'))),
            Some(InputEvent::Char('a'))
        );
        assert_eq!(
            translate_key(press(KeyCode::Char(' '))),
            Some(InputEvent::SubmitEntry)
        );
        assert_eq!(
            translate_key(press(KeyCode::Backspace)),
            Some(InputEvent::Backspace)
        );
        assert_eq!(translate_key(press(KeyCode::Tab)), Some(InputEvent::AnyKey));
    }

    #[test]
    fn translate_abort_keys() {
        assert_eq!(translate_key(press(KeyCode::Esc)), Some(InputEvent::AbortHard));
        assert_eq!(translate_key(press(KeyCode::Enter)), Some(InputEvent::AbortSoft));
        assert_eq!(
            translate_key(press(KeyCode::Modifier(ModifierKeyCode::LeftControl))),
            Some(InputEvent::AbortSoft)
        );
        assert_eq!(
            translate_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(InputEvent::WindowClosed)
        );
    }

    #[test]
    fn translate_ignores_key_release() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(translate_key(release), None);
    }
}
