use super::arena::{NodeId, TreeArena};
use super::ChunkLayout;
use crate::document::Chunk;
use crate::error::{PreprocessError, Result};
use std::io::{self, BufRead};

/// Lines of a stream, newline included
struct RawLines<R> {
    reader: R,
}

impl<R: BufRead> Iterator for RawLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Fold whitespace-only lines into the line before them. Blank lines with
/// no line before them are dropped.
struct BlankMerge<I> {
    lines: I,
    pending: Option<String>,
}

impl<I> Iterator for BlankMerge<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        loop {
            match self.lines.next() {
                Some(Ok(line)) if line.trim().is_empty() => {
                    if let Some(pending) = self.pending.as_mut() {
                        pending.push_str(&line);
                    }
                }
                Some(Ok(line)) => {
                    if let Some(done) = self.pending.replace(line) {
                        return Some(Ok(done));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => return self.pending.take().map(Ok),
            }
        }
    }
}

/// An open position in the tree: where chunks at `level` get appended
struct Frame {
    parent: Option<NodeId>,
    level: usize,
}

/// Build a chunk tree from an indented line stream.
///
/// The level of a line is its leading whitespace width divided by the
/// indent. A deeper line opens a frame under the most recent chunk, however
/// many levels it jumps; a shallower one closes frames until it fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentTreeBuilder {
    indent: usize,
}

impl IndentTreeBuilder {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    /// Consume a line stream. Any read or decode failure is reported as an
    /// invalid `source` document and no partial result is returned.
    pub fn build<R: BufRead>(&self, source: &str, reader: R) -> Result<ChunkLayout> {
        self.build_tree(reader)
            .map_err(|e| PreprocessError::invalid_document(source, e))
    }

    fn level_of(&self, line: &str) -> usize {
        if self.indent == 0 {
            return 0;
        }
        let width = line.chars().take_while(|c| c.is_whitespace()).count();
        width / self.indent
    }

    fn build_tree<R: BufRead>(&self, reader: R) -> io::Result<ChunkLayout> {
        let lines = BlankMerge {
            lines: RawLines { reader },
            pending: None,
        };

        let mut arena = TreeArena::new();
        let mut stack = vec![Frame {
            parent: None,
            level: 0,
        }];
        let mut max_level = 0;

        for (n, line) in lines.enumerate() {
            let line = line?;
            let level = self.level_of(&line);
            let chunk = Chunk::new((n + 1).to_string(), line.trim_start());

            while stack.len() > 1 && stack.last().is_some_and(|f| f.level > level) {
                stack.pop();
            }
            if stack.len() == 1 && level < stack[0].level {
                stack[0].level = level;
            }

            let (parent, top_level) = stack.last().map_or((None, 0), |f| (f.parent, f.level));
            if level > top_level {
                match arena.last_child(parent) {
                    Some(previous) => stack.push(Frame {
                        parent: Some(previous),
                        level,
                    }),
                    // Indented first line: nothing to hang it from
                    None => {
                        if let Some(top) = stack.last_mut() {
                            top.level = level;
                        }
                    }
                }
            }

            let parent = stack.last().and_then(|f| f.parent);
            arena.append(parent, chunk);
            max_level = max_level.max(level);
        }

        let chunks = arena.into_chunks();
        Ok(if max_level > 0 {
            ChunkLayout::Tree(chunks)
        } else {
            ChunkLayout::Sequence(chunks)
        })
    }
}
