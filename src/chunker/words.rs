use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word pattern"));

/// Count the words in a text: maximal runs of word characters
pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Split a text into word units.
///
/// A unit is one word followed by the non-word run after it. Non-word text
/// ahead of the first word is attached to the first unit, so concatenating
/// the units gives back the input. A text with no words at all is a single
/// unit (or nothing, if empty).
pub fn word_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut begin = 0;

    for start in WORD.find_iter(text).map(|m| m.start()).skip(1) {
        units.push(&text[begin..start]);
        begin = start;
    }
    if begin < text.len() {
        units.push(&text[begin..]);
    }

    units
}
