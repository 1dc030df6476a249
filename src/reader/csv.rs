//! CSV files as table source documents.
//!
//! A [`CsvDocument`] is a re-openable cursor over a local file: every pass
//! over its rows reads the file from the start.

use super::Loader;
use crate::document::{file_date, Metadata, RowChunk, SourceDocument};
use crate::error::{PreprocessError, Result};
use ::csv::{Reader, ReaderBuilder, StringRecordsIntoIter};
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// The first row holds column names
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

/// Where the document id comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// The file path, with an optional prefix removed
    Path(Option<String>),
    /// Metadata id if present, else a random one
    Random,
}

impl Default for IdSource {
    fn default() -> Self {
        Self::Path(None)
    }
}

impl IdSource {
    fn document_id(&self, path: &Path) -> Option<String> {
        let Self::Path(prefix) = self else {
            return None;
        };
        let name = path.to_string_lossy();
        let id: &str = match prefix {
            Some(p) => name.strip_prefix(p.as_str()).unwrap_or(name.as_ref()),
            None => name.as_ref(),
        };
        Some(id.to_string())
    }
}

enum Cursor {
    /// Never opened, or closed
    Closed,
    /// Header consumed, rows not yet delivered
    Ready(Reader<File>),
    /// Rows handed out; the next pass reopens the file
    Used,
}

/// A CSV file read as a table
pub struct CsvDocument {
    path: PathBuf,
    options: CsvOptions,
    metadata: Metadata,
    cursor: Cursor,
}

impl CsvDocument {
    pub fn new(
        path: impl Into<PathBuf>,
        options: CsvOptions,
        id: &IdSource,
        metadata: Option<&Metadata>,
    ) -> Self {
        let path = path.into();
        let mut meta = Metadata::new();
        meta.set("document", "origin", "csv");
        if let Some(extra) = metadata {
            meta.merge(extra);
        }
        meta.add_default_meta(None, file_date(&path));
        if let Some(id) = id.document_id(&path) {
            meta.set("document", "id", id);
        }
        Self {
            path,
            options,
            metadata: meta,
            cursor: Cursor::Closed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.cursor, Cursor::Closed)
    }

    /// Open (or reopen) the file and read the header row, if configured
    pub fn open(&mut self) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(self.options.header)
            .flexible(true)
            .from_path(&self.path)?;

        if self.options.header {
            let names: Vec<Value> = reader
                .headers()
                .map_err(|e| self.invalid(e))?
                .iter()
                .map(|name| Value::String(name.to_string()))
                .collect();
            self.metadata.set("column", "name", names);
        }
        self.cursor = Cursor::Ready(reader);
        Ok(())
    }

    /// Start again from the first row
    pub fn reset(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(self.unopened());
        }
        self.open()
    }

    /// Release the file. The document must be opened again before use.
    pub fn close(&mut self) {
        self.cursor = Cursor::Closed;
    }

    /// One pass over the rows, ids `R1`, `R2`, ...
    pub fn rows(&mut self) -> Result<Rows> {
        if matches!(self.cursor, Cursor::Used) {
            self.open()?;
        }
        match std::mem::replace(&mut self.cursor, Cursor::Used) {
            Cursor::Ready(reader) => Ok(Rows {
                source: self.path.display().to_string(),
                records: reader.into_records(),
                count: 0,
            }),
            _ => {
                self.cursor = Cursor::Closed;
                Err(self.unopened())
            }
        }
    }

    /// One pass over the rows in blocks of `size` rows, ids `B1`, `B2`, ...
    pub fn blocks(&mut self, size: usize) -> Result<Blocks> {
        Ok(Blocks {
            rows: self.rows()?,
            size: size.max(1),
            count: 0,
        })
    }

    /// Read all rows into a table document
    pub fn into_document(mut self) -> Result<SourceDocument> {
        let rows = self.rows()?.collect::<Result<Vec<_>>>()?;
        debug!(path = %self.path.display(), rows = rows.len(), "loaded csv document");
        Ok(SourceDocument::table(rows, self.metadata))
    }

    fn unopened(&self) -> PreprocessError {
        PreprocessError::Unopened(self.path.display().to_string())
    }

    fn invalid(&self, cause: ::csv::Error) -> PreprocessError {
        PreprocessError::invalid_document(self.path.display().to_string(), cause)
    }
}

/// Row iterator over an open CSV file. The file is released when the
/// iterator is dropped.
pub struct Rows {
    source: String,
    records: StringRecordsIntoIter<File>,
    count: usize,
}

impl Iterator for Rows {
    type Item = Result<RowChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.count += 1;
        Some(
            record
                .map(|r| RowChunk::new(format!("R{}", self.count), r.iter().map(String::from).collect()))
                .map_err(|e| PreprocessError::invalid_document(&self.source, e)),
        )
    }
}

/// A group of consecutive rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowBlock {
    pub id: String,
    pub data: Vec<Vec<String>>,
}

pub struct Blocks {
    rows: Rows,
    size: usize,
    count: usize,
}

impl Iterator for Blocks {
    type Item = Result<RowBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut data = Vec::with_capacity(self.size);
        for row in self.rows.by_ref().take(self.size) {
            match row {
                Ok(row) => data.push(row.data),
                Err(e) => return Some(Err(e)),
            }
        }
        if data.is_empty() {
            return None;
        }
        self.count += 1;
        Some(Ok(RowBlock {
            id: format!("B{}", self.count),
            data,
        }))
    }
}

/// Loads CSV files as table documents
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    pub options: CsvOptions,
    pub id: IdSource,
}

impl CsvLoader {
    pub fn new(options: CsvOptions, id: IdSource) -> Self {
        Self { options, id }
    }
}

impl Loader for CsvLoader {
    fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        let mut doc = CsvDocument::new(path, self.options, &self.id, metadata);
        doc.open()?;
        doc.into_document()
    }
}

/// Write a table document to a CSV file
pub fn dump_csv(doc: &SourceDocument, path: &Path, options: CsvOptions) -> Result<()> {
    let out = BufWriter::new(File::create(path)?);
    doc.write_csv(out, options.delimiter, options.header)
}
