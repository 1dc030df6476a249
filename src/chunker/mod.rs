mod arena;
mod indent;
mod lines;
mod options;
mod paragraph;
mod window;
mod words;


pub use arena::{NodeId, TreeArena};
pub use indent::IndentTreeBuilder;
pub use lines::LineSplitter;
pub use options::{as_bool, ChunkMode, ChunkOptions, DEFAULT_INDENT, DEFAULT_MAX_WORDS};
pub use paragraph::{ParagraphOptions, ParagraphSplitter};
pub use window::WordSplitter;
pub use words::{count_words, word_units};

use crate::document::Chunk;
use crate::error::{PreprocessError, Result};
use std::io::BufRead;

/// Chunks produced from a source, flat or hierarchical
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkLayout {
    Sequence(Vec<Chunk>),
    Tree(Vec<Chunk>),
}

impl ChunkLayout {
    pub fn chunks(&self) -> &[Chunk] {
        match self {
            Self::Sequence(chunks) | Self::Tree(chunks) => chunks,
        }
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        match self {
            Self::Sequence(chunks) | Self::Tree(chunks) => chunks,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree(_))
    }
}

/// A chunking policy, resolved once from the options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunker {
    Single,
    Line,
    Paragraph(ParagraphOptions),
    Word { max_words: usize },
    Tree(IndentTreeBuilder),
}

impl Chunker {
    pub fn new(options: &ChunkOptions) -> Self {
        match options.mode {
            ChunkMode::Single => Self::Single,
            ChunkMode::Line => Self::Line,
            ChunkMode::Paragraph => Self::Paragraph(ParagraphOptions {
                eos: options.eos,
                min_words: options.min_words,
                max_words: options.max_words(),
            }),
            ChunkMode::Word => Self::Word {
                max_words: options.max_words(),
            },
            ChunkMode::Tree => Self::Tree(IndentTreeBuilder::new(options.indent())),
        }
    }

    /// Lazily split an in-memory text. Tree mode needs a line stream and is
    /// not available here.
    pub fn split<'a>(&self, text: &'a str) -> Option<ChunkStream<'a>> {
        let stream = match *self {
            Self::Single => ChunkStream::Single((!text.is_empty()).then_some(text)),
            Self::Line => ChunkStream::Line(LineSplitter::new(text)),
            Self::Paragraph(options) => {
                ChunkStream::Paragraph(ParagraphSplitter::new(text, options))
            }
            Self::Word { max_words } => ChunkStream::Word(WordSplitter::new(text, max_words)),
            Self::Tree(_) => return None,
        };
        Some(stream)
    }

    /// Chunk a whole stream, numbering chunks from 1 in read order
    pub fn chunk<R: BufRead>(&self, source: &str, mut reader: R) -> Result<ChunkLayout> {
        if let Self::Tree(builder) = self {
            return builder.build(source, reader);
        }

        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| PreprocessError::invalid_document(source, e))?;
        Ok(self.chunk_str(&text))
    }

    /// Chunk an in-memory text, numbering chunks from 1
    pub fn chunk_str(&self, text: &str) -> ChunkLayout {
        match (self, self.split(text)) {
            (_, Some(stream)) => ChunkLayout::Sequence(number_chunks(stream)),
            (Self::Tree(builder), None) => builder
                .build("<memory>", text.as_bytes())
                // A &str is valid UTF-8 and reading memory cannot fail
                .unwrap_or(ChunkLayout::Sequence(Vec::new())),
            (_, None) => ChunkLayout::Sequence(Vec::new()),
        }
    }
}

fn number_chunks(stream: impl Iterator<Item = String>) -> Vec<Chunk> {
    stream
        .enumerate()
        .map(|(n, data)| Chunk::new((n + 1).to_string(), data))
        .collect()
}

/// One-shot lazy sequence of chunk texts
pub enum ChunkStream<'a> {
    Single(Option<&'a str>),
    Line(LineSplitter<'a>),
    Paragraph(ParagraphSplitter<'a>),
    Word(WordSplitter<'a>),
}

impl Iterator for ChunkStream<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self {
            Self::Single(text) => text.take().map(str::to_string),
            Self::Line(s) => s.next(),
            Self::Paragraph(s) => s.next(),
            Self::Word(s) => s.next(),
        }
    }
}
