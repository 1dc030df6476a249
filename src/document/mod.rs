mod chunk;
mod format;
mod metadata;

#[cfg(test)]
mod tests;

pub use chunk::{Chunk, ChunkContext, RowChunk};
pub use format::OutputFormat;
pub use metadata::{file_date, iso_timestamp, Metadata};

use crate::chunker::ChunkLayout;
use crate::error::{PreprocessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Format tag written in every serialized source document
pub const SRCDOC_FORMAT: &str = "piisa:src-document:v1";

/// Shape of a source document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Sequence,
    Tree,
    Table,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Tree => "tree",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sequence" => Ok(Self::Sequence),
            "tree" => Ok(Self::Tree),
            "table" => Ok(Self::Table),
            other => Err(PreprocessError::Config(format!(
                "unknown document type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentBody {
    Sequence(Vec<Chunk>),
    Tree(Vec<Chunk>),
    Table(Vec<RowChunk>),
}

impl DocumentBody {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Sequence(_) => DocumentKind::Sequence,
            Self::Tree(_) => DocumentKind::Tree,
            Self::Table(_) => DocumentKind::Table,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(c) | Self::Tree(c) => c.len(),
            Self::Table(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<ChunkLayout> for DocumentBody {
    fn from(layout: ChunkLayout) -> Self {
        match layout {
            ChunkLayout::Sequence(chunks) => Self::Sequence(chunks),
            ChunkLayout::Tree(chunks) => Self::Tree(chunks),
        }
    }
}

/// A normalized source document: metadata plus a body of chunks
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    metadata: Metadata,
    body: DocumentBody,
}

impl SourceDocument {
    /// Assemble a document. The body kind is recorded in `document.type` and
    /// a random id is assigned if the metadata carries none.
    pub fn new(body: DocumentBody, mut metadata: Metadata) -> Self {
        metadata.set("document", "type", body.kind().as_str());
        if metadata.get_str("document", "id").is_none() {
            metadata.set("document", "id", uuid::Uuid::new_v4().to_string());
        }
        debug!(
            id = metadata.get_str("document", "id").unwrap_or_default(),
            kind = %body.kind(),
            chunks = body.len(),
            "assembled document"
        );
        Self { metadata, body }
    }

    pub fn sequence(chunks: impl IntoIterator<Item = Chunk>, metadata: Metadata) -> Self {
        Self::new(DocumentBody::Sequence(chunks.into_iter().collect()), metadata)
    }

    pub fn tree(chunks: impl IntoIterator<Item = Chunk>, metadata: Metadata) -> Self {
        Self::new(DocumentBody::Tree(chunks.into_iter().collect()), metadata)
    }

    pub fn table(rows: impl IntoIterator<Item = RowChunk>, metadata: Metadata) -> Self {
        Self::new(DocumentBody::Table(rows.into_iter().collect()), metadata)
    }

    pub fn from_layout(layout: ChunkLayout, metadata: Metadata) -> Self {
        Self::new(layout.into(), metadata)
    }

    pub fn id(&self) -> &str {
        self.metadata.get_str("document", "id").unwrap_or_default()
    }

    pub fn kind(&self) -> DocumentKind {
        self.body.kind()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn body(&self) -> &DocumentBody {
        &self.body
    }

    pub fn into_body(self) -> DocumentBody {
        self.body
    }

    /// Top-level chunks of a sequence or tree document
    pub fn chunks(&self) -> &[Chunk] {
        match &self.body {
            DocumentBody::Sequence(c) | DocumentBody::Tree(c) => c,
            DocumentBody::Table(_) => &[],
        }
    }

    pub fn rows(&self) -> &[RowChunk] {
        match &self.body {
            DocumentBody::Table(r) => r,
            _ => &[],
        }
    }

    pub fn add_metadata(&mut self, section: &str, values: serde_json::Map<String, serde_json::Value>) {
        self.metadata.add_metadata(section, values);
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.metadata.set("document", "id", id.into());
    }

    /// Flatten the document into a chunk sequence.
    ///
    /// Trees are walked depth-first in pre-order; each chunk gets its depth
    /// as `level` and the section of its nearest tagged ancestor.
    /// Placeholders are skipped but their children are not. Table rows become
    /// chunks with tab-separated fields. With `with_context`, each chunk also
    /// gets the data of its neighbours as `before` and `after`.
    pub fn iter_chunks(&self, with_context: bool) -> impl Iterator<Item = Chunk> {
        let mut flat = match &self.body {
            DocumentBody::Sequence(chunks) => chunks
                .iter()
                .map(|c| Chunk {
                    children: None,
                    ..c.clone()
                })
                .collect(),
            DocumentBody::Tree(chunks) => flatten_tree(chunks),
            DocumentBody::Table(rows) => rows
                .iter()
                .map(|r| Chunk::new(r.id.clone(), r.data.join("\t")))
                .collect(),
        };
        if with_context {
            add_neighbours(&mut flat);
        }
        flat.into_iter()
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.serialized())?)
    }

    /// Serialize as JSON, pretty-printed when `indent` is given
    pub fn to_json(&self, indent: Option<usize>) -> Result<String> {
        let doc = self.serialized();
        match indent {
            None | Some(0) => Ok(serde_json::to_string(&doc)?),
            Some(n) => {
                let spaces = vec![b' '; n];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&spaces);
                let mut out = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
                doc.serialize(&mut ser)?;
                String::from_utf8(out).map_err(|e| PreprocessError::invalid_document(self.id(), e))
            }
        }
    }

    /// Plain text rendering. Tree chunks are prefixed by `indent * level`
    /// spaces; table rows are written one per line, fields tab-separated.
    pub fn to_text(&self, indent: usize) -> String {
        let mut out = String::new();
        match &self.body {
            DocumentBody::Sequence(chunks) => chunks.iter().for_each(|c| out.push_str(&c.data)),
            DocumentBody::Tree(_) => {
                for chunk in self.iter_chunks(false) {
                    let level = chunk.context.as_ref().and_then(|c| c.level).unwrap_or(0);
                    out.push_str(&" ".repeat(indent * level));
                    out.push_str(&chunk.data);
                }
            }
            DocumentBody::Table(rows) => {
                for row in rows {
                    out.push_str(&row.data.join("\t"));
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Write a table document as CSV, with a header taken from the
    /// `column.name` metadata when requested and present
    pub fn write_csv<W: Write>(&self, writer: W, delimiter: u8, header: bool) -> Result<()> {
        let DocumentBody::Table(rows) = &self.body else {
            return Err(PreprocessError::NotATable(self.id().to_string()));
        };
        let mut out = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(writer);
        if header {
            if let Some(names) = self.column_names() {
                out.write_record(&names)?;
            }
        }
        for row in rows {
            out.write_record(&row.data)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Column names recorded by the CSV reader
    pub fn column_names(&self) -> Option<Vec<String>> {
        let names = self.metadata.get("column", "name")?.as_array()?;
        Some(
            names
                .iter()
                .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                .collect(),
        )
    }

    /// Render in the given output format
    pub fn render(&self, format: OutputFormat, indent: Option<usize>) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text(indent.unwrap_or(crate::chunker::DEFAULT_INDENT))),
            OutputFormat::Yaml => self.to_yaml(),
            OutputFormat::Json => self.to_json(indent),
            OutputFormat::Ndjson => {
                let mut line = self.to_json(None)?;
                line.push('\n');
                Ok(line)
            }
        }
    }

    /// Write the document to a file
    pub fn dump(&self, path: &Path, format: OutputFormat, indent: Option<usize>) -> Result<()> {
        let rendered = self.render(format, indent)?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(rendered.as_bytes())?;
        out.flush()?;
        debug!(path = %path.display(), %format, "wrote document");
        Ok(())
    }

    pub fn from_yaml_str(name: &str, text: &str) -> Result<Self> {
        let doc: SerializedDocument =
            serde_yaml::from_str(text).map_err(|e| PreprocessError::invalid_document(name, e))?;
        doc.into_document(name)
    }

    pub fn from_json_str(name: &str, text: &str) -> Result<Self> {
        let doc: SerializedDocument =
            serde_json::from_str(text).map_err(|e| PreprocessError::invalid_document(name, e))?;
        doc.into_document(name)
    }

    /// Load a serialized source document; JSON for `.json` files, YAML
    /// otherwise
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let name = path.display().to_string();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&name, &text),
            _ => Self::from_yaml_str(&name, &text),
        }
    }

    fn serialized(&self) -> SerializedDocument {
        let chunks = match &self.body {
            DocumentBody::Sequence(c) | DocumentBody::Tree(c) => SerializedChunks::Chunks(c.clone()),
            DocumentBody::Table(r) => SerializedChunks::Rows(r.clone()),
        };
        SerializedDocument {
            format: SRCDOC_FORMAT.to_string(),
            header: self.metadata.clone(),
            chunks,
        }
    }
}

fn flatten_tree(roots: &[Chunk]) -> Vec<Chunk> {
    let mut flat = Vec::new();
    // (chunk, depth, inherited section), popped in pre-order
    let mut stack: Vec<(&Chunk, usize, Option<&str>)> =
        roots.iter().rev().map(|c| (c, 0, None)).collect();

    while let Some((chunk, level, inherited)) = stack.pop() {
        let section = chunk.section().or(inherited);
        for child in chunk.children().iter().rev() {
            stack.push((child, level + 1, section));
        }
        if chunk.is_placeholder() {
            continue;
        }
        flat.push(Chunk {
            id: chunk.id.clone(),
            data: chunk.data.clone(),
            children: None,
            context: Some(ChunkContext {
                section: section.map(str::to_string),
                level: Some(level),
                ..Default::default()
            }),
        });
    }
    flat
}

fn add_neighbours(chunks: &mut [Chunk]) {
    let data: Vec<String> = chunks.iter().map(|c| c.data.clone()).collect();
    for (n, chunk) in chunks.iter_mut().enumerate() {
        let context = chunk.context.get_or_insert_with(ChunkContext::default);
        context.before = n.checked_sub(1).map(|p| data[p].clone());
        context.after = data.get(n + 1).cloned();
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedDocument {
    format: String,
    #[serde(default)]
    header: Metadata,
    #[serde(default = "SerializedChunks::empty")]
    chunks: SerializedChunks,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SerializedChunks {
    Rows(Vec<RowChunk>),
    Chunks(Vec<Chunk>),
}

impl SerializedChunks {
    fn empty() -> Self {
        Self::Chunks(Vec::new())
    }
}

impl SerializedDocument {
    fn into_document(self, name: &str) -> Result<SourceDocument> {
        if self.format != SRCDOC_FORMAT {
            return Err(PreprocessError::invalid_document(
                name,
                format!("unsupported format '{}'", self.format),
            ));
        }
        let declared = self
            .header
            .get_str("document", "type")
            .map(DocumentKind::from_str)
            .transpose()
            .map_err(|e| PreprocessError::invalid_document(name, e))?;

        let body = match (declared, self.chunks) {
            (Some(DocumentKind::Table), SerializedChunks::Rows(rows)) => DocumentBody::Table(rows),
            (Some(DocumentKind::Table), SerializedChunks::Chunks(c)) if c.is_empty() => {
                DocumentBody::Table(Vec::new())
            }
            (Some(DocumentKind::Tree), SerializedChunks::Chunks(c)) => DocumentBody::Tree(c),
            (Some(DocumentKind::Sequence), SerializedChunks::Chunks(c)) => DocumentBody::Sequence(c),
            (None, SerializedChunks::Chunks(c)) if c.iter().any(|c| c.children.is_some()) => {
                DocumentBody::Tree(c)
            }
            (None, SerializedChunks::Chunks(c)) => DocumentBody::Sequence(c),
            (None, SerializedChunks::Rows(rows)) => DocumentBody::Table(rows),
            (_, SerializedChunks::Rows(rows)) if rows.is_empty() => match declared {
                Some(DocumentKind::Tree) => DocumentBody::Tree(Vec::new()),
                _ => DocumentBody::Sequence(Vec::new()),
            },
            (Some(kind), _) => {
                return Err(PreprocessError::invalid_document(
                    name,
                    format!("chunks do not match document type '{kind}'"),
                ))
            }
        };
        Ok(SourceDocument::new(body, self.header))
    }
}
