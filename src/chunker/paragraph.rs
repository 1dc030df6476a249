use super::lines::Pieces;
use super::window::WordSplitter;
use super::words::count_words;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::LazyLock;

/// End of paragraph: a newline followed by at least one blank line
static EOP_BLANK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:\s*\n)+").expect("valid paragraph pattern"));

/// End of paragraph: end-of-sentence punctuation (Latin, Devanagari, CJK,
/// Arabic, ellipsis) closing a line, or a blank-line run
static EOP_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[.?!।|。！？⋯…؟]+\s*\n(?:\s*\n)*|\n(?:\s*\n)+)")
        .expect("valid sentence pattern")
});

/// Word limits applied while grouping paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphOptions {
    /// Also end paragraphs at end-of-sentence punctuation closing a line
    pub eos: bool,
    /// Join paragraphs until the total goes above this (0 = no minimum)
    pub min_words: usize,
    /// Never emit chunks with this many words or more (0 = no maximum)
    pub max_words: usize,
}

/// Split a text into paragraphs, each keeping its trailing boundary text.
///
/// With word limits, short paragraphs are accumulated until they go above
/// `min_words`, and chunks reaching `max_words` are flushed early or, for a
/// single oversized paragraph, cut into windows of `max_words` words.
/// One-shot.
pub struct ParagraphSplitter<'a> {
    pieces: Pieces<'a>,
    options: ParagraphOptions,
    pending: String,
    pending_words: usize,
    ready: VecDeque<String>,
    exhausted: bool,
}

impl<'a> ParagraphSplitter<'a> {
    pub fn new(text: &'a str, options: ParagraphOptions) -> Self {
        let boundary = if options.eos {
            LazyLock::force(&EOP_SENTENCE)
        } else {
            LazyLock::force(&EOP_BLANK)
        };
        Self {
            pieces: Pieces::new(text, boundary),
            options,
            pending: String::new(),
            pending_words: 0,
            ready: VecDeque::new(),
            exhausted: false,
        }
    }

    fn push(&mut self, para: &str) {
        let ParagraphOptions {
            min_words,
            max_words,
            ..
        } = self.options;

        if min_words == 0 && max_words == 0 {
            self.emit(para.to_string());
            return;
        }

        let para_words = count_words(para);
        let total = self.pending_words + para_words;

        // Below the minimum: keep accumulating
        if min_words > 0 && total <= min_words {
            self.pending.push_str(para);
            self.pending_words = total;
            return;
        }

        if max_words == 0 || total < max_words {
            let mut chunk = std::mem::take(&mut self.pending);
            chunk.push_str(para);
            self.emit(chunk);
        } else {
            let previous = std::mem::take(&mut self.pending);
            self.emit(previous);
            if para_words < max_words {
                self.emit(para.to_string());
            } else {
                for window in WordSplitter::new(para, max_words) {
                    self.emit(window);
                }
            }
        }
        self.pending_words = 0;
    }

    fn emit(&mut self, chunk: String) {
        if !chunk.is_empty() {
            self.ready.push_back(chunk);
        }
    }
}

impl Iterator for ParagraphSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(chunk);
            }
            if self.exhausted {
                return None;
            }
            match self.pieces.next() {
                Some(para) => self.push(para),
                None => {
                    self.exhausted = true;
                    let last = std::mem::take(&mut self.pending);
                    self.emit(last);
                }
            }
        }
    }
}
