use super::words::word_units;

/// Fixed windows of whole words over a text, ignoring paragraph boundaries.
///
/// One-shot: the splitter is consumed by iteration and cannot be restarted.
pub struct WordSplitter<'a> {
    units: std::vec::IntoIter<&'a str>,
    size: usize,
}

impl<'a> WordSplitter<'a> {
    pub fn new(text: &'a str, max_words: usize) -> Self {
        Self {
            units: word_units(text).into_iter(),
            size: max_words.max(1),
        }
    }
}

impl Iterator for WordSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let window: String = self.units.by_ref().take(self.size).collect();
        if window.is_empty() {
            None
        } else {
            Some(window)
        }
    }
}
