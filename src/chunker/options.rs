use crate::error::{PreprocessError, Result};
use std::fmt;
use std::str::FromStr;

/// Indent width used to infer levels in tree mode
pub const DEFAULT_INDENT: usize = 2;

/// Window size for word mode when `max_words` is not given
pub const DEFAULT_MAX_WORDS: usize = 100;

/// How a text buffer is decomposed into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkMode {
    /// The whole document in a single chunk
    Single,
    /// One chunk per line, blank lines attached to the preceding one
    #[default]
    Line,
    /// Hierarchy inferred from leading indentation
    Tree,
    /// Paragraphs, optionally balanced by word counts
    Paragraph,
    /// Fixed windows of whole words
    Word,
}

impl ChunkMode {
    pub const ALL: [ChunkMode; 5] = [
        ChunkMode::Single,
        ChunkMode::Line,
        ChunkMode::Tree,
        ChunkMode::Paragraph,
        ChunkMode::Word,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Line => "line",
            Self::Tree => "tree",
            Self::Paragraph => "paragraph",
            Self::Word => "word",
        }
    }
}

impl fmt::Display for ChunkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkMode {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "line" => Ok(Self::Line),
            "tree" => Ok(Self::Tree),
            "para" | "paragraph" => Ok(Self::Paragraph),
            "word" | "words" => Ok(Self::Word),
            other => Err(PreprocessError::Config(format!(
                "unknown chunking mode: {}",
                other
            ))),
        }
    }
}

/// Chunking options, as delivered by configuration or the command line.
///
/// All values arrive as strings and are coerced here, so a bad value
/// fails before any source is read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkOptions {
    pub mode: ChunkMode,
    pub indent: Option<usize>,
    pub eos: bool,
    pub min_words: usize,
    pub max_words: Option<usize>,
}

impl ChunkOptions {
    pub fn new(mode: ChunkMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Build options from `(name, value)` string pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        options.validate()?;
        Ok(options)
    }

    /// Parse `NAME=VALUE` assignments, as given on the command line
    pub fn parse_assignments<S: AsRef<str>>(&mut self, items: &[S]) -> Result<()> {
        for item in items {
            let (key, value) = item.as_ref().split_once('=').ok_or_else(|| {
                PreprocessError::Config(format!(
                    "invalid chunk option '{}': expected NAME=VALUE",
                    item.as_ref()
                ))
            })?;
            self.set(key.trim(), value.trim())?;
        }
        self.validate()
    }

    /// Check the combination of options: word windows need a positive size
    pub fn validate(&self) -> Result<()> {
        if self.mode == ChunkMode::Word && self.max_words == Some(0) {
            return Err(PreprocessError::Config(
                "max_words must be positive in word mode".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a single option from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "mode" => self.mode = value.parse()?,
            "indent" => self.indent = Some(parse_count(key, value)?),
            "eos" => self.eos = as_bool(value),
            "min_words" => self.min_words = parse_count(key, value)?,
            "max_words" => self.max_words = Some(parse_count(key, value)?),
            other => tracing::warn!(option = other, "ignoring unknown chunk option"),
        }
        Ok(())
    }

    /// Indent width for tree mode
    pub fn indent(&self) -> usize {
        self.indent.unwrap_or(DEFAULT_INDENT)
    }

    /// Maximum words per chunk, with the default depending on the mode
    pub fn max_words(&self) -> usize {
        match (self.max_words, self.mode) {
            (Some(n), _) => n,
            (None, ChunkMode::Word) => DEFAULT_MAX_WORDS,
            (None, _) => 0,
        }
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        PreprocessError::Config(format!(
            "invalid value for chunk option '{}': {}",
            key, value
        ))
    })
}

/// Interpret a string or number as a boolean flag
pub fn as_bool(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "t" | "true" | "yes"
    )
}
