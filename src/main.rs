use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;
use typometer::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, EventSource, HostEvent, Runner, Ticker},
    text_source::{DefaultTextSource, FileTextSource, InlineTextSource, TextSource},
    ui::{Board, Palette, TerminalSink},
    InputEvent, RenderSink, Session, SessionConfig,
};

/// typing speed trainer with live stats and a per-character accuracy summary
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test: type the shown text word by word, pressing space after each word. Time, precision, characters and words per minute update live, and a per-character precision chart closes every round."
)]
pub struct Cli {
    /// path to the text to type
    text: Option<PathBuf>,

    /// custom prompt to use instead of a text file
    #[clap(short = 'p', long, conflicts_with = "text")]
    prompt: Option<String>,

    /// hide the elapsed time
    #[clap(long)]
    no_time: bool,

    /// hide the precision
    #[clap(long)]
    no_precision: bool,

    /// hide characters per minute
    #[clap(long)]
    no_cpm: bool,

    /// hide words per minute
    #[clap(long)]
    no_wpm: bool,

    /// skip the per-character precision chart in the summary
    #[clap(long)]
    no_graph: bool,

    /// milliseconds between screen updates
    #[clap(short = 'd', long)]
    update_delay_ms: Option<u64>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// file to write logs to
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        self.config
            .as_ref()
            .map(FileConfigStore::with_path)
            .unwrap_or_default()
    }

    /// Command line flags win over the stored config
    fn apply_to(&self, config: &mut Config) {
        if let Some(text) = &self.text {
            config.text_path = Some(text.clone());
        }
        if self.no_time {
            config.display_time = false;
        }
        if self.no_precision {
            config.display_precision = false;
        }
        if self.no_cpm {
            config.display_chars_per_minute = false;
        }
        if self.no_wpm {
            config.display_words_per_minute = false;
        }
        if self.no_graph {
            config.display_final_graph = false;
        }
        if let Some(delay) = self.update_delay_ms {
            config.update_delay_ms = delay;
        }
    }

    fn text_source(&self, config: &Config) -> Box<dyn TextSource> {
        match (&self.prompt, &config.text_path) {
            (Some(prompt), _) => Box::new(InlineTextSource::new(prompt.clone())),
            (None, Some(path)) => Box::new(FileTextSource::new(path)),
            (None, None) => Box::new(DefaultTextSource),
        }
    }
}

fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    init_logging(&log_path);

    let store = cli.config_store();
    let mut config = store.load();
    cli.apply_to(&mut config);
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    let session_config = SessionConfig::from(&config);
    let mut session = Session::new(session_config, cli.text_source(&config));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let board = Board::new(session_config, Palette::from(&config.style));
    let mut sink = TerminalSink::new(terminal, board);
    let runner = Runner::new(CrosstermEventSource::new(), session.ticker());

    let result = run_rounds(&mut session, &runner, &mut sink);

    disable_raw_mode()?;
    execute!(sink.terminal_mut().backend_mut(), LeaveAlternateScreen)?;
    sink.terminal_mut().show_cursor()?;

    result
}

#[derive(Debug, PartialEq)]
enum NextRound {
    Again,
    Quit,
}

fn run_rounds<E: EventSource, T: Ticker, B: Backend>(
    session: &mut Session,
    runner: &Runner<E, T>,
    sink: &mut TerminalSink<B>,
) -> Result<(), Box<dyn Error>> {
    loop {
        session.start(runner, sink)?;

        if wait_for_next_round(runner, sink) == NextRound::Quit {
            break;
        }
    }

    Ok(())
}

fn wait_for_next_round<E: EventSource, T: Ticker>(
    runner: &Runner<E, T>,
    sink: &mut dyn RenderSink,
) -> NextRound {
    loop {
        match runner.step() {
            HostEvent::Input(InputEvent::AbortSoft) => return NextRound::Again,
            HostEvent::Input(InputEvent::AbortHard | InputEvent::WindowClosed) => {
                return NextRound::Quit
            }
            HostEvent::Resize => sink.redraw(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use std::time::Duration;
    use typometer::runtime::{FixedTicker, TestEventSource};
    use typometer::session::NullSink;
    use typometer::SessionState;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typometer"]);

        assert_eq!(cli.text, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.no_time);
        assert!(!cli.no_graph);
        assert_eq!(cli.update_delay_ms, None);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_text_path() {
        let cli = Cli::parse_from(["typometer", "texts/fox.txt"]);
        assert_eq!(cli.text, Some(PathBuf::from("texts/fox.txt")));
    }

    #[test]
    fn test_cli_prompt_conflicts_with_text() {
        let result = Cli::try_parse_from(["typometer", "fox.txt", "-p", "hello"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["typometer", "-p", "hello world"]);
        assert_eq!(cli.prompt, Some("hello world".to_string()));

        let cli = Cli::parse_from(["typometer", "--prompt", "custom text"]);
        assert_eq!(cli.prompt, Some("custom text".to_string()));
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "typometer",
            "fox.txt",
            "--no-time",
            "--no-cpm",
            "--no-graph",
            "-d",
            "20",
        ]);
        let mut config = Config::default();

        cli.apply_to(&mut config);

        assert_eq!(config.text_path, Some(PathBuf::from("fox.txt")));
        assert!(!config.display_time);
        assert!(config.display_precision);
        assert!(!config.display_chars_per_minute);
        assert!(config.display_words_per_minute);
        assert!(!config.display_final_graph);
        assert_eq!(config.update_delay_ms, 20);
    }

    #[test]
    fn test_cli_leaves_config_alone_without_flags() {
        let cli = Cli::parse_from(["typometer"]);
        let mut config = Config {
            display_time: false,
            update_delay_ms: 42,
            ..Config::default()
        };
        let before = config.clone();

        cli.apply_to(&mut config);

        assert_eq!(config, before);
    }

    #[test]
    fn test_text_source_prefers_prompt() {
        let cli = Cli::parse_from(["typometer", "-p", "one two"]);
        let config = Config {
            text_path: Some(PathBuf::from("ignored.txt")),
            ..Config::default()
        };

        let words = cli.text_source(&config).read_words().unwrap();

        assert_eq!(words, vec!["one", "two"]);
    }

    #[test]
    fn test_text_source_defaults_to_nothing() {
        let cli = Cli::parse_from(["typometer"]);
        let words = cli.text_source(&Config::default()).read_words().unwrap();
        assert!(words.is_empty());
    }

    #[test]
    fn test_wait_for_next_round() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        tx.send(HostEvent::Input(InputEvent::Char('x'))).unwrap();
        tx.send(HostEvent::Input(InputEvent::AbortSoft)).unwrap();
        assert_eq!(wait_for_next_round(&runner, &mut NullSink), NextRound::Again);

        tx.send(HostEvent::Input(InputEvent::AbortHard)).unwrap();
        assert_eq!(wait_for_next_round(&runner, &mut NullSink), NextRound::Quit);

        drop(tx);
        assert_eq!(wait_for_next_round(&runner, &mut NullSink), NextRound::Quit);
    }

    #[test]
    fn test_run_rounds_plays_two_rounds_then_quits() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        let config = SessionConfig::default();
        let mut session = Session::new(config, InlineTextSource::new("hi"));
        let terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut sink = TerminalSink::new(terminal, Board::new(config, Palette::default()));

        let round = [
            InputEvent::Char('h'),
            InputEvent::Char('i'),
            InputEvent::SubmitEntry,
            InputEvent::CloseSummary,
        ];
        let script = round
            .iter()
            .cloned()
            .chain([InputEvent::AbortSoft])
            .chain(round.iter().cloned())
            .chain([InputEvent::AbortHard]);
        for event in script {
            tx.send(HostEvent::Input(event)).unwrap();
        }
        // left over when exactly two rounds were played
        tx.send(HostEvent::Resize).unwrap();
        drop(tx);

        run_rounds(&mut session, &runner, &mut sink).unwrap();

        assert_eq!(runner.step(), HostEvent::Resize);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(sink.board().state, SessionState::Idle);
    }
}
