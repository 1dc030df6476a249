use crate::error::PreprocessError;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output formats for source documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
    Ndjson,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Yaml => "yml",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }

    /// Deduce the format from a file name extension
    pub fn from_path(path: &Path) -> Result<Self, PreprocessError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                PreprocessError::Config(format!(
                    "cannot deduce output format for '{}'",
                    path.display()
                ))
            })?;
        ext.parse()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = PreprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "yml" | "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            other => Err(PreprocessError::Config(format!(
                "invalid output format: {other}"
            ))),
        }
    }
}
