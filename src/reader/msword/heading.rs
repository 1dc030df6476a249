use crate::chunker::{NodeId, TreeArena};
use crate::document::Chunk;

/// A Word paragraph: its text and the name of its paragraph style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub style: Option<String>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Some(style.into()),
        }
    }
}

/// Heading level of a style name: `Heading<N>`, N a positive integer
pub fn heading_level(style: &str) -> Option<usize> {
    style
        .strip_prefix("Heading")?
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
}

/// Newline-terminate paragraphs and fold blank ones into the paragraph
/// before them.
///
/// A folded paragraph keeps its own style, or takes the style of the blank
/// one if it had none. A leading blank paragraph becomes a paragraph with no
/// style.
pub struct MergedParagraphs<I> {
    paragraphs: I,
    pending: Option<Paragraph>,
}

impl<I> MergedParagraphs<I> {
    pub fn new(paragraphs: I) -> Self {
        Self {
            paragraphs,
            pending: None,
        }
    }
}

impl<I: Iterator<Item = Paragraph>> Iterator for MergedParagraphs<I> {
    type Item = Paragraph;

    fn next(&mut self) -> Option<Paragraph> {
        for Paragraph { mut text, style } in self.paragraphs.by_ref() {
            let blank = text.trim().is_empty();
            text.push('\n');

            if !blank {
                if let Some(done) = self.pending.replace(Paragraph { text, style }) {
                    return Some(done);
                }
                continue;
            }
            match self.pending.as_mut() {
                Some(pending) => {
                    pending.text.push_str(&text);
                    if pending.style.is_none() {
                        pending.style = style;
                    }
                }
                None => self.pending = Some(Paragraph { text, style: None }),
            }
        }
        self.pending.take()
    }
}

/// A top-level group under construction: the heading that opened it and
/// everything below it. Stack entries are tagged with their heading level.
struct Group {
    arena: TreeArena,
    stack: Vec<(NodeId, usize)>,
}

impl Group {
    fn open(heading: Chunk, level: usize) -> Self {
        let section = heading.data.trim().to_string();
        let mut arena = TreeArena::new();
        let root = arena.append(None, heading.with_section(section));
        Self {
            arena,
            stack: vec![(root, level)],
        }
    }

    fn append_body(&mut self, chunk: Chunk) {
        let parent = self.stack.last().map(|&(node, _)| node);
        self.arena.append(parent, chunk);
    }

    /// Place a heading below the innermost open heading of a lower level,
    /// filling skipped levels with placeholders. Hands the heading back if
    /// the group has no such heading.
    fn insert_heading(&mut self, heading: Chunk, level: usize) -> Result<(), Chunk> {
        while self.stack.last().is_some_and(|&(_, l)| l >= level) {
            self.stack.pop();
        }
        let Some(&(mut parent, top_level)) = self.stack.last() else {
            return Err(heading);
        };
        for skipped in top_level + 1..level {
            parent = self.arena.append(Some(parent), Chunk::placeholder());
            self.stack.push((parent, skipped));
        }
        let node = self.arena.append(Some(parent), heading);
        self.stack.push((node, level));
        Ok(())
    }

    fn finish(self) -> Option<Chunk> {
        self.arena.into_chunks().into_iter().next()
    }
}

/// Build a chunk tree from Word paragraphs, using heading styles as the
/// level signal.
///
/// Yields top-level chunks lazily: body text before the first heading as
/// flat chunks, then one chunk per group, rooted at the heading that opened
/// it and tagged with its section. Ids are `P{n}` over merged paragraphs.
pub struct HeadingTreeBuilder<I> {
    paragraphs: MergedParagraphs<I>,
    count: usize,
    group: Option<Group>,
}

impl<I: Iterator<Item = Paragraph>> HeadingTreeBuilder<I> {
    pub fn new(paragraphs: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            paragraphs: MergedParagraphs::new(paragraphs.into_iter()),
            count: 0,
            group: None,
        }
    }

    /// Returns the group closed by this heading, if any
    fn place_heading(&mut self, heading: Chunk, level: usize) -> Option<Chunk> {
        let heading = match self.group.as_mut() {
            Some(group) if level > 1 => match group.insert_heading(heading, level) {
                Ok(()) => return None,
                Err(heading) => heading,
            },
            _ => heading,
        };
        self.group
            .replace(Group::open(heading, level))
            .and_then(Group::finish)
    }
}

impl<I: Iterator<Item = Paragraph>> Iterator for HeadingTreeBuilder<I> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        while let Some(paragraph) = self.paragraphs.next() {
            self.count += 1;
            let level = paragraph.style.as_deref().and_then(heading_level);
            let chunk = Chunk::new(format!("P{}", self.count), paragraph.text);

            if let Some(level) = level {
                if let Some(closed) = self.place_heading(chunk, level) {
                    return Some(closed);
                }
                continue;
            }
            match self.group.as_mut() {
                Some(group) => group.append_body(chunk),
                None => return Some(chunk),
            }
        }
        self.group.take().and_then(Group::finish)
    }
}
