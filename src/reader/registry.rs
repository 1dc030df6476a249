use super::csv::{CsvLoader, CsvOptions, IdSource};
use super::{Loader, MsWordLoader, SrcDocLoader, TextLoader};
use crate::chunker::{as_bool, ChunkOptions};
use crate::collection::FolderCollection;
use crate::document::{Metadata, SourceDocument};
use crate::error::{PreprocessError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Format tag accepted in loader configuration files
pub const LOADER_CONFIG_FORMAT: &str = "pii-preprocess:loader:v1";

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_SRCDOC: &str = "application/x-piisa-srcdoc";
pub const MIME_DIRECTORY: &str = "inode/directory";

/// Maps a set of file extensions to a document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntry {
    #[serde(deserialize_with = "one_or_many")]
    pub ext: Vec<String>,
    pub mime: String,
}

impl TypeEntry {
    pub fn new(ext: &[&str], mime: &str) -> Self {
        Self {
            ext: ext.iter().map(|e| e.to_string()).collect(),
            mime: mime.to_string(),
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(ext) => vec![ext],
        OneOrMany::Many(exts) => exts,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    Text,
    Csv,
    Msword,
    Srcdoc,
    Folder,
}

/// How to load one document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderSpec {
    pub kind: LoaderKind,
    /// Loader options; values may be strings, numbers or booleans
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// Metadata added to every document this loader produces
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl LoaderSpec {
    pub fn new(kind: LoaderKind) -> Self {
        Self {
            kind,
            options: Map::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    fn option_str(&self, key: &str) -> Option<String> {
        self.options.get(key).and_then(value_string)
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.option_str(key).map_or(default, |v| as_bool(&v))
    }

    fn chunk_options(&self) -> Result<ChunkOptions> {
        let Some(values) = self.options.get("chunk_options") else {
            return Ok(ChunkOptions::default());
        };
        let values = values.as_object().ok_or_else(|| {
            PreprocessError::Config("chunk_options must be an object".to_string())
        })?;
        ChunkOptions::from_pairs(
            values
                .iter()
                .filter_map(|(k, v)| value_string(v).map(|v| (k.as_str(), v))),
        )
    }

    fn csv_loader(&self) -> Result<CsvLoader> {
        let mut options = CsvOptions {
            header: self.flag("header", true),
            ..CsvOptions::default()
        };
        if let Some(delimiter) = self.option_str("delimiter") {
            options.delimiter = delimiter_byte(&delimiter)?;
        }
        let id = match self.options.get("id_path_prefix") {
            Some(Value::Bool(false)) => IdSource::Random,
            Some(Value::String(prefix)) => IdSource::Path(Some(prefix.clone())),
            _ => IdSource::Path(None),
        };
        Ok(CsvLoader::new(options, id))
    }

    /// Instantiate a document loader
    pub fn document_loader(&self) -> Result<Box<dyn Loader>> {
        Ok(match self.kind {
            LoaderKind::Text => Box::new(TextLoader::new(self.chunk_options()?)),
            LoaderKind::Csv => Box::new(self.csv_loader()?),
            LoaderKind::Msword => Box::new(MsWordLoader::new(self.flag("tree", true))),
            LoaderKind::Srcdoc => Box::new(SrcDocLoader),
            LoaderKind::Folder => {
                return Err(PreprocessError::Config(
                    "folder loader does not produce single documents".to_string(),
                ))
            }
        })
    }
}

fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A single-byte field delimiter
pub fn delimiter_byte(value: &str) -> Result<u8> {
    match value.as_bytes() {
        [b] => Ok(*b),
        _ if value == "\\t" => Ok(b'\t'),
        _ => Err(PreprocessError::Config(format!(
            "invalid delimiter '{value}': must be a single ASCII character"
        ))),
    }
}

/// Loader configuration: document types by extension, loaders by type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub loaders: HashMap<String, LoaderSpec>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let types = vec![
            TypeEntry::new(&["txt", "text"], MIME_TEXT),
            TypeEntry::new(&["csv"], MIME_CSV),
            TypeEntry::new(&["docx"], MIME_DOCX),
            TypeEntry::new(&["yml", "yaml", "json"], MIME_SRCDOC),
        ];
        let loaders = HashMap::from([
            (
                MIME_TEXT.to_string(),
                LoaderSpec::new(LoaderKind::Text)
                    .with_option("chunk_options", serde_json::json!({"mode": "line"})),
            ),
            (
                MIME_CSV.to_string(),
                LoaderSpec::new(LoaderKind::Csv).with_option("header", true),
            ),
            (
                MIME_DOCX.to_string(),
                LoaderSpec::new(LoaderKind::Msword).with_option("tree", true),
            ),
            (MIME_SRCDOC.to_string(), LoaderSpec::new(LoaderKind::Srcdoc)),
            (MIME_DIRECTORY.to_string(), LoaderSpec::new(LoaderKind::Folder)),
        ]);
        Self {
            format: Some(LOADER_CONFIG_FORMAT.to_string()),
            types,
            loaders,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        match config.format.as_deref() {
            None | Some(LOADER_CONFIG_FORMAT) => Ok(config),
            Some(other) => Err(PreprocessError::Config(format!(
                "unsupported loader config format: {other}"
            ))),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text).map_err(|e| match e {
            PreprocessError::Json(e) => {
                PreprocessError::Config(format!("invalid loader config '{}': {e}", path.display()))
            }
            other => other,
        })
    }
}

/// What a loaded source turned out to be
pub enum Source {
    Document(SourceDocument),
    Collection(FolderCollection),
}

/// Dispatch table from file extensions to document loaders
#[derive(Debug, Clone)]
pub struct LoaderRegistry {
    /// Extension -> document types, most recently configured first
    types: HashMap<String, Vec<String>>,
    /// Document type -> loader
    loaders: HashMap<String, LoaderSpec>,
}

impl LoaderRegistry {
    /// Create a registry with the built-in configuration
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.add_config(LoaderConfig::default());
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            loaders: HashMap::new(),
        }
    }

    /// Built-in configuration plus configuration files, later files winning
    pub fn with_config_files<P: AsRef<Path>>(files: &[P]) -> Result<Self> {
        let mut registry = Self::new();
        for file in files {
            registry.add_config(LoaderConfig::from_file(file.as_ref())?);
        }
        Ok(registry)
    }

    pub fn add_config(&mut self, config: LoaderConfig) {
        self.loaders.extend(config.loaders);
        for entry in config.types {
            for ext in entry.ext {
                let ext = ext.trim_start_matches('.').to_lowercase();
                let mimes = self.types.entry(ext).or_default();
                mimes.retain(|m| *m != entry.mime);
                mimes.insert(0, entry.mime.clone());
            }
        }
    }

    /// Document types that may apply to a path
    pub fn types_for(&self, path: &Path) -> Vec<&str> {
        if path.is_dir() {
            return vec![MIME_DIRECTORY];
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        self.types
            .get(&ext)
            .map(|mimes| mimes.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn loader_for(&self, mime: &str) -> Option<&LoaderSpec> {
        self.loaders.get(mime)
    }

    /// Load a source: a single document or a folder collection.
    ///
    /// Each candidate type is tried in turn; a candidate that rejects the
    /// file as an invalid document passes it on to the next one.
    pub fn load(&self, path: &Path, metadata: Option<&Metadata>) -> Result<Source> {
        let name = path.display().to_string();
        let mut rejected = Vec::new();

        for mime in self.types_for(path) {
            let spec = self
                .loader_for(mime)
                .ok_or_else(|| PreprocessError::NoLoader(format!("{name} (type {mime})")))?;

            let mut meta = spec.metadata.clone();
            if let Some(extra) = metadata {
                meta.merge(extra);
            }

            if spec.kind == LoaderKind::Folder {
                let recursive = spec.flag("recursive", false);
                let mut collection = FolderCollection::new(path, self.clone(), recursive)?;
                if let Some(pattern) = spec.option_str("glob") {
                    collection = collection.with_glob(&pattern)?;
                }
                return Ok(Source::Collection(collection.with_metadata(meta)));
            }

            debug!(path = %name, mime, kind = ?spec.kind, "loading document");
            match spec.document_loader()?.load(path, Some(&meta)) {
                Ok(doc) => return Ok(Source::Document(doc)),
                Err(PreprocessError::InvalidDocument { cause, .. }) => {
                    rejected.push(format!("{mime}: {cause}"))
                }
                Err(e) => return Err(e),
            }
        }

        if rejected.is_empty() {
            Err(PreprocessError::NoLoader(name))
        } else {
            Err(PreprocessError::invalid_document(name, rejected.join(", ")))
        }
    }

    /// Load a source that must be a single document
    pub fn load_document(&self, path: &Path, metadata: Option<&Metadata>) -> Result<SourceDocument> {
        match self.load(path, metadata)? {
            Source::Document(doc) => Ok(doc),
            Source::Collection(_) => Err(PreprocessError::NoLoader(format!(
                "{} is a collection",
                path.display()
            ))),
        }
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
