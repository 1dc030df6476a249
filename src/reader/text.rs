use super::Loader;
use crate::chunker::{ChunkOptions, Chunker};
use crate::document::{file_date, Metadata, SourceDocument};
use crate::error::Result;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Loads plain text files, chunked according to the chunk options
#[derive(Debug, Clone, Default)]
pub struct TextLoader {
    options: ChunkOptions,
}

impl TextLoader {
    pub fn new(options: ChunkOptions) -> Self {
        Self { options }
    }

    pub fn read(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        self.options.validate()?;
        let chunker = Chunker::new(&self.options);
        let name = path.display().to_string();

        let mut meta = metadata.cloned().unwrap_or_default();
        meta.add_default_meta(Some("text"), file_date(path));

        let layout = {
            let reader = BufReader::new(File::open(path)?);
            chunker.chunk(&name, reader)?
        };
        debug!(
            path = %name,
            mode = %self.options.mode,
            chunks = layout.chunks().len(),
            "loaded text document"
        );
        Ok(SourceDocument::from_layout(layout, meta))
    }
}

impl Loader for TextLoader {
    fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        self.read(path, metadata)
    }
}
