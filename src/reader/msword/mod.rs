mod docx;
mod heading;


pub use docx::DocxPackage;
pub use heading::{heading_level, HeadingTreeBuilder, MergedParagraphs, Paragraph};

use super::Loader;
use crate::document::{Chunk, Metadata, SourceDocument};
use crate::error::{PreprocessError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Loads Word documents, either as a tree built from heading styles or as a
/// flat sequence of paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsWordLoader {
    pub tree: bool,
}

impl Default for MsWordLoader {
    fn default() -> Self {
        Self { tree: true }
    }
}

impl MsWordLoader {
    pub fn new(tree: bool) -> Self {
        Self { tree }
    }

    pub fn read(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        let name = path.display().to_string();
        let file = File::open(path)?;
        let package = DocxPackage::read(BufReader::new(file))
            .map_err(|cause| PreprocessError::invalid_document(&name, cause))?;

        let mut meta = Metadata::new();
        meta.set("document", "origin", "msword");
        meta.add_metadata("document", package.properties);
        if let Some(extra) = metadata {
            meta.merge(extra);
        }

        let doc = if self.tree {
            SourceDocument::tree(HeadingTreeBuilder::new(package.paragraphs), meta)
        } else {
            let chunks = MergedParagraphs::new(package.paragraphs.into_iter())
                .enumerate()
                .map(|(n, p)| Chunk::new(format!("P{}", n + 1), p.text));
            SourceDocument::sequence(chunks, meta)
        };
        debug!(path = %name, kind = %doc.kind(), chunks = doc.body().len(), "loaded word document");
        Ok(doc)
    }
}

impl Loader for MsWordLoader {
    fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        self.read(path, metadata)
    }
}
