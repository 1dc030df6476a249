pub mod csv;
pub mod msword;
mod registry;
mod text;


pub use self::csv::{CsvDocument, CsvLoader, CsvOptions, IdSource, RowBlock, Rows};
pub use msword::MsWordLoader;
pub use registry::{
    delimiter_byte, LoaderConfig, LoaderKind, LoaderRegistry, LoaderSpec, Source, TypeEntry,
};
pub use text::TextLoader;

use crate::document::{Metadata, SourceDocument};
use crate::error::Result;
use std::path::Path;

/// Core trait that all document loaders implement
pub trait Loader: Send + Sync {
    /// Read a local file into a source document
    ///
    /// # Arguments
    /// * `path` - File to read
    /// * `metadata` - Extra metadata, merged over what the loader extracts
    fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument>;
}

/// Reads serialized source documents (YAML or JSON)
#[derive(Debug, Clone, Copy, Default)]
pub struct SrcDocLoader;

impl Loader for SrcDocLoader {
    fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        let mut doc = SourceDocument::load(path)?;
        if let Some(extra) = metadata {
            for (section, values) in extra.sections() {
                doc.add_metadata(section, values.clone());
            }
        }
        Ok(doc)
    }
}
