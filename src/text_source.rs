use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use itertools::Itertools;

/// Words used when a source yields nothing to type.
pub const DEFAULT_WORDS: [&str; 5] = ["There", "should", "be", "something", "here"];

/// A source could not be read for a reason other than being absent.
#[derive(Debug)]
pub struct TextSourceError {
    source_name: String,
    cause: io::Error,
}

impl TextSourceError {
    pub fn new(source_name: impl Into<String>, cause: io::Error) -> Self {
        Self {
            source_name: source_name.into(),
            cause,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.cause.kind()
    }
}

impl fmt::Display for TextSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read text from {}: {}", self.source_name, self.cause)
    }
}

impl std::error::Error for TextSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Something that yields the word tokens for a session.
pub trait TextSource {
    fn read_words(&self) -> Result<Vec<String>, TextSourceError>;

    /// Human readable name used in logs and errors.
    fn describe(&self) -> String;
}

impl<T: TextSource + ?Sized> TextSource for Box<T> {
    fn read_words(&self) -> Result<Vec<String>, TextSourceError> {
        (**self).read_words()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

/// Reads whitespace separated words from a file. A missing file yields no words.
#[derive(Debug, Clone)]
pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for FileTextSource {
    fn read_words(&self) -> Result<Vec<String>, TextSourceError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(split_words(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %self.path.display(),
                    "text source not found, using default text"
                );
                Ok(vec![])
            }
            Err(e) => Err(TextSourceError::new(self.describe(), e)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Words supplied directly, e.g. from the command line.
#[derive(Debug, Clone, Default)]
pub struct InlineTextSource {
    text: String,
}

impl InlineTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextSource for InlineTextSource {
    fn read_words(&self) -> Result<Vec<String>, TextSourceError> {
        Ok(split_words(&self.text))
    }

    fn describe(&self) -> String {
        "inline prompt".to_string()
    }
}

/// Always yields nothing, so sessions fall back to [`DEFAULT_WORDS`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextSource;

impl TextSource for DefaultTextSource {
    fn read_words(&self) -> Result<Vec<String>, TextSourceError> {
        Ok(vec![])
    }

    fn describe(&self) -> String {
        "default text".to_string()
    }
}

/// The immutable word sequence of one session. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    words: Vec<String>,
}

impl TargetText {
    /// Build from source words, falling back to the default sentence when empty.
    pub fn from_words(words: Vec<String>) -> Self {
        let words: Vec<String> = words.into_iter().filter(|w| !w.is_empty()).collect();
        if words.is_empty() {
            Self::default()
        } else {
            Self { words }
        }
    }

    pub fn load(source: &dyn TextSource) -> Result<Self, TextSourceError> {
        Ok(Self::from_words(source.read_words()?))
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of letters, spaces excluded.
    pub fn letter_count(&self) -> usize {
        self.words.iter().map(|w| w.chars().count()).sum()
    }

    /// The text as displayed: every word followed by one space.
    pub fn rendered(&self) -> String {
        format!("{} ", self.words.iter().join(" "))
    }
}

impl Default for TargetText {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}
