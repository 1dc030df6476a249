use serde::{Deserialize, Serialize};

/// A unit of decomposed document text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier, unique within the document. Placeholder containers
    /// synthesized for skipped heading levels have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Text payload
    #[serde(default)]
    pub data: String,
    /// Child chunks, for tree documents
    #[serde(
        rename = "chunks",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<Chunk>>,
    /// Ancillary fields attached by tree builders and context iteration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChunkContext>,
}

/// Context attached to a chunk
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChunkContext {
    /// Text of the nearest enclosing level-1 heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Depth in the tree (roots are 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    /// Data of the previous chunk in traversal order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Data of the next chunk in traversal order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

impl ChunkContext {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Chunk {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            data: data.into(),
            children: None,
            context: None,
        }
    }

    /// An empty container standing in for a missing tree level
    pub fn placeholder() -> Self {
        Self {
            id: None,
            data: String::new(),
            children: None,
            context: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.context.get_or_insert_with(ChunkContext::default).section = Some(section.into());
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    pub fn children(&self) -> &[Chunk] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn section(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.section.as_deref())
    }
}

/// A table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowChunk {
    pub id: String,
    pub data: Vec<String>,
}

impl RowChunk {
    pub fn new(id: impl Into<String>, data: Vec<String>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}
