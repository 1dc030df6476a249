use crate::document::{Metadata, SourceDocument};
use crate::error::{PreprocessError, Result};
use crate::reader::LoaderRegistry;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// The files of a local folder, loaded as source documents.
///
/// Files are visited sorted by name; files with no loader are skipped.
/// An optional glob pattern selects files by name, at any depth when the
/// collection is recursive.
#[derive(Debug)]
pub struct FolderCollection {
    base: PathBuf,
    recursive: bool,
    glob: Option<GlobMatcher>,
    registry: LoaderRegistry,
    metadata: Metadata,
}

impl FolderCollection {
    pub fn new(base: impl Into<PathBuf>, registry: LoaderRegistry, recursive: bool) -> Result<Self> {
        let base = base.into();
        if !base.is_dir() {
            return Err(PreprocessError::Config(format!(
                "invalid folder: {}",
                base.display()
            )));
        }
        Ok(Self {
            base,
            recursive,
            glob: None,
            registry,
            metadata: Metadata::new(),
        })
    }

    /// Metadata added to every document in the collection
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Only load files whose name matches a glob pattern
    pub fn with_glob(mut self, pattern: &str) -> Result<Self> {
        let glob = Glob::new(pattern).map_err(|e| {
            PreprocessError::Config(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
        self.glob = Some(glob.compile_matcher());
        Ok(self)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Files that will be offered to the loaders, in visiting order
    pub fn files(&self) -> Vec<PathBuf> {
        let depth = if self.recursive { usize::MAX } else { 1 };
        WalkDir::new(&self.base)
            .min_depth(1)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(folder = %self.base.display(), error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.selects(e.file_name()))
            .map(|e| e.into_path())
            .collect()
    }

    fn selects(&self, name: &std::ffi::OsStr) -> bool {
        self.glob.as_ref().map_or(true, |glob| glob.is_match(name))
    }

    /// Load the documents one at a time
    pub fn documents(&self) -> impl Iterator<Item = Result<SourceDocument>> + '_ {
        info!(
            folder = %self.base.display(),
            recursive = self.recursive,
            glob = self.glob.as_ref().map(|g| g.glob().glob()),
            "reading collection"
        );
        let mut dataset = Metadata::new();
        dataset.set("dataset", "source", self.base.display().to_string());
        dataset.merge(&self.metadata);

        self.files()
            .into_iter()
            .filter_map(move |path| match self.registry.load_document(&path, Some(&dataset)) {
                Ok(doc) => {
                    info!(path = %path.display(), id = doc.id(), "loaded");
                    Some(Ok(doc))
                }
                Err(PreprocessError::NoLoader(_)) => {
                    warn!(path = %path.display(), "skipping file with no loader");
                    None
                }
                Err(e) => Some(Err(e)),
            })
    }
}
