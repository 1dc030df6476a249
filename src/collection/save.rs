use crate::document::{OutputFormat, SourceDocument};
use crate::error::{PreprocessError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

enum Target {
    /// One document per line in a single file
    Ndjson(BufWriter<File>),
    /// One file per document in a directory
    Directory(PathBuf),
}

/// Writes a sequence of documents, either as an NDJSON file or as numbered
/// files in an existing directory
pub struct CollectionSaver {
    target: Target,
    format: OutputFormat,
    indent: Option<usize>,
    count: usize,
}

impl CollectionSaver {
    pub fn new(output: &Path, format: OutputFormat, indent: Option<usize>) -> Result<Self> {
        let target = match format {
            OutputFormat::Ndjson => Target::Ndjson(BufWriter::new(File::create(output)?)),
            _ if output.is_dir() => Target::Directory(output.to_path_buf()),
            _ => {
                return Err(PreprocessError::Config(format!(
                    "invalid output '{}': not a directory",
                    output.display()
                )))
            }
        };
        Ok(Self {
            target,
            format,
            indent,
            count: 0,
        })
    }

    /// Number of documents saved so far
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn save(&mut self, doc: &SourceDocument) -> Result<()> {
        self.count += 1;
        match &mut self.target {
            Target::Ndjson(out) => {
                out.write_all(doc.render(OutputFormat::Ndjson, None)?.as_bytes())?;
            }
            Target::Directory(base) => {
                let safe_id = doc.id().replace(['/', '\\'], "-");
                let name = base.join(format!("{:03}-{}.{}", self.count, safe_id, self.format));
                doc.dump(&name, self.format, self.indent)?;
                debug!(path = %name.display(), "saved document");
            }
        }
        Ok(())
    }

    /// Flush pending output
    pub fn finish(mut self) -> Result<usize> {
        if let Target::Ndjson(out) = &mut self.target {
            out.flush()?;
        }
        Ok(self.count)
    }
}
