use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::session::SessionConfig;

/// Colour names understood by ratatui (`"green"`, `"lightblue"`, `"#ffa500"`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    pub text: String,
    pub current: String,
    pub correct: String,
    pub incorrect: String,
    pub stats: String,
    pub bars: [String; 2],
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            text: "white".to_string(),
            current: "white".to_string(),
            correct: "green".to_string(),
            incorrect: "red".to_string(),
            stats: "blue".to_string(),
            bars: ["blue".to_string(), "#ffa500".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub text_path: Option<PathBuf>,
    pub display_time: bool,
    pub display_precision: bool,
    pub display_chars_per_minute: bool,
    pub display_words_per_minute: bool,
    pub display_final_graph: bool,
    pub update_delay_ms: u64,
    pub style: StyleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_path: None,
            display_time: true,
            display_precision: true,
            display_chars_per_minute: true,
            display_words_per_minute: true,
            display_final_graph: true,
            update_delay_ms: 5,
            style: StyleConfig::default(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            display_time: cfg.display_time,
            display_precision: cfg.display_precision,
            display_chars_per_minute: cfg.display_chars_per_minute,
            display_words_per_minute: cfg.display_words_per_minute,
            display_final_graph: cfg.display_final_graph,
            update_delay: Duration::from_millis(cfg.update_delay_ms),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring malformed config"
                );
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
