// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod config;
pub mod metrics;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod summary;
pub mod text_source;
pub mod ui;
pub mod util;

pub use session::{InputEvent, RenderSink, Session, SessionConfig, SessionState};
pub use text_source::{TextSource, TextSourceError};
