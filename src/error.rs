use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid document '{name}': {cause}")]
    InvalidDocument { name: String, cause: String },

    #[error("source not opened: {0}")]
    Unopened(String),

    #[error("cannot find a loader for: {0}")]
    NoLoader(String),

    #[error("not a table document: {0}")]
    NotATable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl PreprocessError {
    /// Wrap a failure that happened while consuming a source
    pub fn invalid_document(name: impl Into<String>, cause: impl ToString) -> Self {
        Self::InvalidDocument {
            name: name.into(),
            cause: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
