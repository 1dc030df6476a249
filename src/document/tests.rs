use super::*;
use crate::chunker::{ChunkMode, ChunkOptions, Chunker};
use serde_json::json;

fn meta(id: &str) -> Metadata {
    let mut m = Metadata::new();
    m.set("document", "id", id);
    m
}

/// a
///   b
///     (placeholder)
///       c
/// d
fn sample_tree() -> Vec<Chunk> {
    let mut a = Chunk::new("1", "a\n").with_section("a");
    let mut b = Chunk::new("2", "b\n");
    let mut hole = Chunk::placeholder();
    hole.children = Some(vec![Chunk::new("3", "c\n")]);
    b.children = Some(vec![hole]);
    a.children = Some(vec![b]);
    vec![a, Chunk::new("4", "d\n")]
}

// ========================================================================
// Metadata
// ========================================================================

#[test]
fn test_metadata_merge_later_wins() {
    let mut m = Metadata::new();
    m.set("document", "title", "old");
    let incoming = json!({"title": "new", "lang": "en"});
    m.add_metadata("document", incoming.as_object().cloned().unwrap());
    assert_eq!(m.get_str("document", "title"), Some("new"));
    assert_eq!(m.get_str("document", "lang"), Some("en"));
}

#[test]
fn test_default_meta_does_not_override() {
    let mut m = Metadata::new();
    m.set("document", "origin", "csv");
    m.add_default_meta(Some("text"), Some("2024-01-01T00:00:00".into()));
    assert_eq!(m.get_str("document", "origin"), Some("csv"));
    assert_eq!(m.get_str("document", "date"), Some("2024-01-01T00:00:00"));
}

#[test]
fn test_metadata_assignments() {
    let values = Metadata::parse_assignments(&["lang=en", "url=http://x?a=b", "flag"]);
    assert_eq!(values["lang"], "en");
    assert_eq!(values["url"], "http://x?a=b");
    assert_eq!(values["flag"], "");
}

#[test]
fn test_iso_timestamp() {
    let t = std::time::UNIX_EPOCH + std::time::Duration::from_secs(86_400 + 61);
    assert_eq!(iso_timestamp(t), "1970-01-02T00:01:01");
}

// ========================================================================
// Assembly
// ========================================================================

#[test]
fn test_assembly_sets_type_and_id() {
    let doc = SourceDocument::sequence(vec![Chunk::new("1", "x")], Metadata::new());
    assert_eq!(doc.kind(), DocumentKind::Sequence);
    assert_eq!(doc.metadata().get_str("document", "type"), Some("sequence"));
    assert_eq!(doc.id().len(), 36, "random uuid expected");

    let doc = SourceDocument::table(vec![], meta("t1"));
    assert_eq!(doc.id(), "t1");
    assert_eq!(doc.metadata().get_str("document", "type"), Some("table"));
}

#[test]
fn test_from_layout_keeps_shape() {
    let chunker = Chunker::new(&ChunkOptions {
        indent: Some(2),
        ..ChunkOptions::new(ChunkMode::Tree)
    });
    let doc = SourceDocument::from_layout(chunker.chunk_str("a\n  b\n"), meta("d"));
    assert_eq!(doc.kind(), DocumentKind::Tree);
    assert_eq!(doc.chunks()[0].children()[0].data, "b\n");
}

// ========================================================================
// Context iteration
// ========================================================================

#[test]
fn test_iter_chunks_tree_levels_and_sections() {
    let doc = SourceDocument::tree(sample_tree(), meta("t"));
    let flat: Vec<Chunk> = doc.iter_chunks(false).collect();

    let ids: Vec<&str> = flat.iter().map(|c| c.id()).collect();
    assert_eq!(ids, ["1", "2", "3", "4"], "placeholder skipped");

    let levels: Vec<usize> = flat
        .iter()
        .map(|c| c.context.as_ref().and_then(|x| x.level).unwrap())
        .collect();
    assert_eq!(levels, [0, 1, 3, 0]);

    assert_eq!(flat[2].section(), Some("a"), "section inherited");
    assert_eq!(flat[3].section(), None);
    assert!(flat.iter().all(|c| c.children.is_none()));
}

#[test]
fn test_iter_chunks_with_context() {
    let chunks = vec![
        Chunk::new("1", "one"),
        Chunk::new("2", "two"),
        Chunk::new("3", "three"),
    ];
    let doc = SourceDocument::sequence(chunks, meta("s"));
    let flat: Vec<Chunk> = doc.iter_chunks(true).collect();

    let ctx = |n: usize| flat[n].context.clone().unwrap();
    assert_eq!(ctx(0).before, None);
    assert_eq!(ctx(0).after.as_deref(), Some("two"));
    assert_eq!(ctx(1).before.as_deref(), Some("one"));
    assert_eq!(ctx(2).after, None);

    let plain: Vec<Chunk> = doc.iter_chunks(false).collect();
    assert!(plain.iter().all(|c| c.context.is_none()));
}

#[test]
fn test_iter_chunks_table_rows() {
    let rows = vec![RowChunk::new("R1", vec!["a".into(), "b".into()])];
    let doc = SourceDocument::table(rows, meta("t"));
    let flat: Vec<Chunk> = doc.iter_chunks(false).collect();
    assert_eq!(flat[0].data, "a\tb");
    assert_eq!(flat[0].id(), "R1");
}

// ========================================================================
// Serialization
// ========================================================================

#[test]
fn test_yaml_round_trip_tree() {
    let doc = SourceDocument::tree(sample_tree(), meta("t"));
    let yaml = doc.to_yaml().unwrap();
    assert!(yaml.starts_with("format: "));
    assert!(yaml.contains(SRCDOC_FORMAT));
    assert!(yaml.contains("chunks:"));

    let back = SourceDocument::from_yaml_str("t.yml", &yaml).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn test_json_round_trip_table() {
    let mut m = meta("csv1");
    m.set("column", "name", json!(["x", "y"]));
    let rows = vec![
        RowChunk::new("R1", vec!["1".into(), "2".into()]),
        RowChunk::new("R2", vec!["3".into(), "4".into()]),
    ];
    let doc = SourceDocument::table(rows, m);
    let text = doc.to_json(Some(2)).unwrap();
    assert!(text.contains("\n  \"header\""));

    let back = SourceDocument::from_json_str("t.json", &text).unwrap();
    assert_eq!(back, doc);
    assert_eq!(back.column_names().unwrap(), ["x", "y"]);
}

#[test]
fn test_empty_sequence_round_trip() {
    let doc = SourceDocument::sequence(vec![], meta("e"));
    let back = SourceDocument::from_json_str("e", &doc.to_json(None).unwrap()).unwrap();
    assert_eq!(back.kind(), DocumentKind::Sequence);
    assert!(back.body().is_empty());
}

#[test]
fn test_reject_unknown_format() {
    let err = SourceDocument::from_yaml_str("x.yml", "format: other\nchunks: []\n").unwrap_err();
    assert!(matches!(err, PreprocessError::InvalidDocument { .. }));
}

#[test]
fn test_text_output_indents_tree() {
    let doc = SourceDocument::tree(sample_tree(), meta("t"));
    assert_eq!(doc.to_text(2), "a\n  b\n      c\nd\n");
    assert_eq!(doc.to_text(0), "a\nb\nc\nd\n");
}

#[test]
fn test_ndjson_is_one_line() {
    let doc = SourceDocument::tree(sample_tree(), meta("t"));
    let line = doc.render(OutputFormat::Ndjson, Some(4)).unwrap();
    assert_eq!(line.matches('\n').count(), 1);
    assert!(line.ends_with("}\n"));
}

#[test]
fn test_write_csv() {
    let mut m = meta("t");
    m.set("column", "name", json!(["name", "city"]));
    let rows = vec![RowChunk::new("R1", vec!["Ann".into(), "Paris; FR".into()])];
    let doc = SourceDocument::table(rows, m);

    let mut out = Vec::new();
    doc.write_csv(&mut out, b';', true).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "name;city\nAnn;\"Paris; FR\"\n");

    let mut out = Vec::new();
    doc.write_csv(&mut out, b',', false).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Ann,Paris; FR\n");
}

#[test]
fn test_write_csv_rejects_non_table() {
    let doc = SourceDocument::sequence(vec![Chunk::new("1", "x")], meta("s"));
    let err = doc.write_csv(Vec::new(), b',', true).unwrap_err();
    assert!(matches!(err, PreprocessError::NotATable(id) if id == "s"));
}

#[test]
fn test_dump_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.yml");
    let doc = SourceDocument::sequence(vec![Chunk::new("1", "hello\n")], meta("f"));
    doc.dump(&path, OutputFormat::Yaml, None).unwrap();
    assert_eq!(SourceDocument::load(&path).unwrap(), doc);
}

#[test]
fn test_output_format_from_path() {
    assert_eq!(
        OutputFormat::from_path(Path::new("out.yaml")).unwrap(),
        OutputFormat::Yaml
    );
    assert_eq!(
        OutputFormat::from_path(Path::new("a/b.txt")).unwrap(),
        OutputFormat::Text
    );
    assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    assert!("docx".parse::<OutputFormat>().is_err());
}
