use regex::{Matches, Regex};
use std::sync::LazyLock;

/// A newline, with trailing whitespace before it and any blank lines after it
static NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n(?:\s*\n)*").expect("valid newline pattern"));

/// Pieces of a text cut at each match of a boundary pattern.
///
/// Every piece is the text up to a boundary plus the boundary itself, and a
/// last piece holds whatever follows the final boundary. No piece is empty,
/// and the pieces concatenate back to the input.
pub(crate) struct Pieces<'a> {
    text: &'a str,
    boundaries: Matches<'static, 'a>,
    pos: usize,
}

impl<'a> Pieces<'a> {
    pub(crate) fn new(text: &'a str, boundary: &'static Regex) -> Self {
        Self {
            text,
            boundaries: boundary.find_iter(text),
            pos: 0,
        }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        match self.boundaries.next() {
            Some(m) => {
                let piece = &self.text[self.pos..m.end()];
                self.pos = m.end();
                Some(piece)
            }
            None if self.pos < self.text.len() => {
                let piece = &self.text[self.pos..];
                self.pos = self.text.len();
                Some(piece)
            }
            None => None,
        }
    }
}

/// Split a text into lines, with runs of blank lines folded into the line
/// before them. One-shot.
pub struct LineSplitter<'a> {
    pieces: Pieces<'a>,
}

impl<'a> LineSplitter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            pieces: Pieces::new(text, &NEWLINE),
        }
    }
}

impl Iterator for LineSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.pieces.next().map(str::to_string)
    }
}
