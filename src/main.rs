//! pii-preprocess: convert documents into chunked PII source documents
//!
//! Reads plain text, CSV, Word and serialized source documents (or whole
//! folders of them) and writes them as YAML, JSON, NDJSON, text or CSV.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pii_preprocess::{
    collection::CollectionSaver,
    document::Metadata,
    reader::{csv::dump_csv, delimiter_byte, CsvDocument},
    ChunkMode, ChunkOptions, CsvOptions, IdSource, LoaderRegistry, OutputFormat, Source,
    SourceDocument, TextLoader,
};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pii-preprocess")]
#[command(about = "Convert documents into chunked PII source documents")]
#[command(version)]
struct Cli {
    /// Debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load any supported document (or a folder of them) and write it out
    Convert {
        /// Input document or folder
        input: PathBuf,

        /// Output file (or directory, for collections)
        output: PathBuf,

        /// Additional loader configuration files
        #[arg(long, num_args = 1.., value_name = "CONFIG_FILE")]
        config: Vec<PathBuf>,

        /// Treat the source as a document collection
        #[arg(long)]
        collection: bool,

        /// Add document metadata
        #[arg(long = "metadata-document", visible_alias = "mdoc", num_args = 1.., value_name = "NAME=VAL")]
        mdoc: Vec<String>,

        /// Add dataset metadata
        #[arg(long = "metadata-dataset", visible_alias = "mset", num_args = 1.., value_name = "NAME=VAL")]
        mset: Vec<String>,

        /// Output format (text, yml, json, ndjson); deduced from the output name if absent
        #[arg(long)]
        format: Option<OutputFormat>,

        /// JSON indent, or plain text indent for tree documents
        #[arg(long)]
        indent: Option<usize>,
    },

    /// Convert plain text to a source document, or a source document to text
    Text {
        /// Input file (text, or YAML/JSON source document)
        input: PathBuf,

        /// Output file; format deduced from its extension
        output: PathBuf,

        /// Text chunking mode
        #[arg(long, default_value = "line")]
        mode: ChunkMode,

        /// Text chunking options
        #[arg(long, num_args = 1.., value_name = "NAME=VAL")]
        chunk_options: Vec<String>,

        /// Indent width used to detect the tree hierarchy in text input
        #[arg(long, value_name = "NUMCHARS")]
        input_indent: Option<usize>,

        /// Output indent (for text or JSON output)
        #[arg(long, value_name = "NUMCHARS")]
        output_indent: Option<usize>,
    },

    /// Convert a CSV file to a table source document, or back
    Csv {
        /// Input file (CSV, or YAML source document)
        input: PathBuf,

        /// Output file
        output: PathBuf,

        /// No heading row
        #[arg(long)]
        noheader: bool,

        /// CSV field separator
        #[arg(long, value_name = "CHAR")]
        sep: Option<String>,

        /// When reading CSV, assign a random document id
        #[arg(long, conflicts_with = "id_prefix")]
        id_random: bool,

        /// When reading CSV, path prefix to remove from the document id
        #[arg(long)]
        id_prefix: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            collection,
            mdoc,
            mset,
            format,
            indent,
        } => {
            let registry = LoaderRegistry::with_config_files(&config)
                .context("Failed to load loader configuration")?;
            let metadata = cli_metadata(&mdoc, &mset);
            let format = match format {
                Some(f) => f,
                None => OutputFormat::from_path(&output)?,
            };
            if collection {
                convert_collection(&registry, &input, &output, metadata.as_ref(), format, indent)
            } else {
                convert_document(&registry, &input, &output, metadata.as_ref(), format, indent)
            }
        }
        Commands::Text {
            input,
            output,
            mode,
            chunk_options,
            input_indent,
            output_indent,
        } => convert_text(&input, &output, mode, &chunk_options, input_indent, output_indent),
        Commands::Csv {
            input,
            output,
            noheader,
            sep,
            id_random,
            id_prefix,
        } => {
            let mut options = CsvOptions {
                header: !noheader,
                ..CsvOptions::default()
            };
            if let Some(sep) = sep {
                options.delimiter = delimiter_byte(&sep)?;
            }
            let id = if id_random {
                IdSource::Random
            } else {
                IdSource::Path(id_prefix.or_else(|| parent_prefix(&input)))
            };
            convert_csv(&input, &output, options, &id)
        }
    }
}

/// Metadata given on the command line, if any
fn cli_metadata(mdoc: &[String], mset: &[String]) -> Option<Metadata> {
    if mdoc.is_empty() && mset.is_empty() {
        return None;
    }
    let mut metadata = Metadata::new();
    if !mdoc.is_empty() {
        metadata.add_metadata("document", Metadata::parse_assignments(mdoc));
    }
    if !mset.is_empty() {
        metadata.add_metadata("dataset", Metadata::parse_assignments(mset));
    }
    Some(metadata)
}

fn convert_document(
    registry: &LoaderRegistry,
    input: &Path,
    output: &Path,
    metadata: Option<&Metadata>,
    format: OutputFormat,
    indent: Option<usize>,
) -> Result<()> {
    if format == OutputFormat::Ndjson {
        bail!("ndjson is not valid for individual documents");
    }
    let doc = registry
        .load_document(input, metadata)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    doc.dump(output, format, indent)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(id = doc.id(), output = %output.display(), "document converted");
    Ok(())
}

fn convert_collection(
    registry: &LoaderRegistry,
    input: &Path,
    output: &Path,
    metadata: Option<&Metadata>,
    format: OutputFormat,
    indent: Option<usize>,
) -> Result<()> {
    let mut saver = CollectionSaver::new(output, format, indent)
        .with_context(|| format!("Cannot write to {}", output.display()))?;

    match registry
        .load(input, metadata)
        .with_context(|| format!("Failed to load {}", input.display()))?
    {
        Source::Document(doc) => saver.save(&doc)?,
        Source::Collection(collection) => {
            for doc in collection.documents() {
                saver.save(&doc?)?;
            }
        }
    }
    let count = saver.finish()?;
    info!(documents = count, output = %output.display(), "collection converted");
    Ok(())
}

fn is_srcdoc(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml" | "yaml" | "json")
    )
}

fn convert_text(
    input: &Path,
    output: &Path,
    mode: ChunkMode,
    assignments: &[String],
    input_indent: Option<usize>,
    output_indent: Option<usize>,
) -> Result<()> {
    let doc = if is_srcdoc(input) {
        SourceDocument::load(input)
    } else {
        let mut options = ChunkOptions::new(mode);
        options.indent = input_indent;
        options.parse_assignments(assignments)?;
        TextLoader::new(options).read(input, None)
    }
    .with_context(|| format!("Failed to load {}", input.display()))?;

    let format = OutputFormat::from_path(output)?;
    doc.dump(output, format, output_indent)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(id = doc.id(), chunks = doc.body().len(), "text document converted");
    Ok(())
}

/// Prefix that reduces a path to its file name
fn parent_prefix(path: &Path) -> Option<String> {
    let parent = path.parent()?.to_string_lossy().into_owned();
    (!parent.is_empty()).then(|| format!("{parent}/"))
}

fn convert_csv(input: &Path, output: &Path, options: CsvOptions, id: &IdSource) -> Result<()> {
    if is_srcdoc(input) {
        let doc = SourceDocument::load(input)
            .with_context(|| format!("Failed to load {}", input.display()))?;
        dump_csv(&doc, output, options)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!(rows = doc.rows().len(), output = %output.display(), "csv written");
        return Ok(());
    }

    let mut table = CsvDocument::new(input, options, id, None);
    table
        .open()
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let doc = table.into_document()?;
    let format = OutputFormat::from_path(output).unwrap_or(OutputFormat::Yaml);
    doc.dump(output, format, None)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(id = doc.id(), rows = doc.rows().len(), "table document written");
    Ok(())
}
