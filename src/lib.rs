// Public API exports
pub mod chunker;
pub mod collection;
pub mod document;
pub mod error;
pub mod reader;

// Re-export main types for convenience
pub use error::{PreprocessError, Result};

pub use chunker::{ChunkLayout, ChunkMode, ChunkOptions, Chunker, DEFAULT_INDENT, DEFAULT_MAX_WORDS};

pub use document::{
    Chunk, ChunkContext, DocumentBody, DocumentKind, Metadata, OutputFormat, RowChunk,
    SourceDocument,
};

pub use reader::{
    CsvDocument, CsvLoader, CsvOptions, IdSource, Loader, LoaderConfig, LoaderRegistry,
    MsWordLoader, Source, TextLoader,
};

pub use collection::{CollectionSaver, FolderCollection};
