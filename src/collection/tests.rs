use super::*;
use crate::document::{Metadata, OutputFormat, SourceDocument};
use crate::error::PreprocessError;
use crate::reader::{LoaderConfig, LoaderRegistry, Source};
use std::fs;
use tempfile::TempDir;

fn populate(dir: &TempDir) {
    fs::write(dir.path().join("b.txt"), "beta\n").unwrap();
    fs::write(dir.path().join("a.csv"), "x,y\n1,2\n").unwrap();
    fs::write(dir.path().join("skip.bin"), [0u8, 1, 2]).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("c.txt"), "gamma\n").unwrap();
}

fn origins(collection: &FolderCollection) -> Vec<String> {
    collection
        .documents()
        .map(|doc| {
            let doc = doc.unwrap();
            doc.metadata()
                .get_str("document", "origin")
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn test_folder_sorted_and_skips_unknown() {
    let dir = TempDir::new().unwrap();
    populate(&dir);

    let flat = FolderCollection::new(dir.path(), LoaderRegistry::new(), false).unwrap();
    assert_eq!(origins(&flat), ["csv", "text"]);

    let deep = FolderCollection::new(dir.path(), LoaderRegistry::new(), true).unwrap();
    assert_eq!(deep.files().len(), 4);
    assert_eq!(origins(&deep), ["csv", "text", "text"]);
}

fn populate_oceans(dir: &TempDir) {
    let lang = dir.path().join("lang");
    fs::create_dir(&lang).unwrap();
    fs::write(dir.path().join("notes-indian-ocean.md"), "no loader\n").unwrap();
    fs::write(dir.path().join("readme.txt"), "top\n").unwrap();
    fs::write(lang.join("en-indian-ocean.txt"), "The Indian Ocean\n").unwrap();
    fs::write(lang.join("fr-indian-ocean.txt"), "L'océan Indien\n").unwrap();
    fs::write(lang.join("en-arctic-ocean.txt"), "The Arctic Ocean\n").unwrap();
}

fn names(collection: &FolderCollection) -> Vec<String> {
    collection
        .files()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_folder_glob() {
    let dir = TempDir::new().unwrap();
    populate_oceans(&dir);

    let lang = FolderCollection::new(dir.path().join("lang"), LoaderRegistry::new(), false)
        .unwrap()
        .with_glob("*-indian-ocean.*")
        .unwrap();
    assert_eq!(names(&lang), ["en-indian-ocean.txt", "fr-indian-ocean.txt"]);
    assert_eq!(lang.documents().count(), 2);

    let top = FolderCollection::new(dir.path(), LoaderRegistry::new(), false)
        .unwrap()
        .with_glob("*-indian-ocean.*")
        .unwrap();
    assert_eq!(names(&top), ["notes-indian-ocean.md"]);
    assert_eq!(top.documents().count(), 0, "no loader for .md");
}

#[test]
fn test_folder_glob_recursive() {
    let dir = TempDir::new().unwrap();
    populate_oceans(&dir);

    let collection = FolderCollection::new(dir.path(), LoaderRegistry::new(), true)
        .unwrap()
        .with_glob("*-indian-ocean.txt")
        .unwrap();
    let docs: Vec<SourceDocument> = collection.documents().map(|d| d.unwrap()).collect();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].chunks()[0].data, "The Indian Ocean\n");
}

#[test]
fn test_folder_glob_from_loader_config() {
    let dir = TempDir::new().unwrap();
    populate_oceans(&dir);

    let config = LoaderConfig::from_json_str(
        r#"{
            "loaders": {"inode/directory": {"kind": "folder", "options": {"glob": "*-indian-ocean.*", "recursive": true}}}
        }"#,
    )
    .unwrap();
    let mut registry = LoaderRegistry::new();
    registry.add_config(config);

    match registry.load(dir.path(), None).unwrap() {
        Source::Collection(c) => assert_eq!(c.documents().count(), 2),
        Source::Document(_) => panic!("expected a collection"),
    }
}

#[test]
fn test_folder_invalid_glob() {
    let dir = TempDir::new().unwrap();
    let err = FolderCollection::new(dir.path(), LoaderRegistry::new(), false)
        .unwrap()
        .with_glob("[a-")
        .unwrap_err();
    assert!(matches!(err, PreprocessError::Config(_)));
}

#[cfg(unix)]
#[test]
fn test_folder_unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    populate(&dir);
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("hidden.txt"), "x\n").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    let collection = FolderCollection::new(dir.path(), LoaderRegistry::new(), true).unwrap();
    let files = names(&collection);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    // Readable files are still listed, whether or not the process may
    // enter the locked directory
    for name in ["a.csv", "b.txt", "c.txt"] {
        assert!(files.iter().any(|f| f == name), "{name} missing from {files:?}");
    }
}

#[test]
fn test_folder_adds_dataset_metadata() {
    let dir = TempDir::new().unwrap();
    populate(&dir);

    let mut meta = Metadata::new();
    meta.set("dataset", "name", "sample");
    let collection = FolderCollection::new(dir.path(), LoaderRegistry::new(), false)
        .unwrap()
        .with_metadata(meta);

    for doc in collection.documents() {
        let doc = doc.unwrap();
        assert_eq!(doc.metadata().get_str("dataset", "name"), Some("sample"));
        assert!(doc.metadata().get_str("dataset", "source").is_some());
    }
}

#[test]
fn test_registry_opens_directories_as_collections() {
    let dir = TempDir::new().unwrap();
    populate(&dir);

    match LoaderRegistry::new().load(dir.path(), None).unwrap() {
        Source::Collection(c) => assert_eq!(c.base(), dir.path()),
        Source::Document(_) => panic!("expected a collection"),
    }
}

#[test]
fn test_invalid_folder() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = FolderCollection::new(&missing, LoaderRegistry::new(), false).unwrap_err();
    assert!(matches!(err, PreprocessError::Config(_)));
}

#[test]
fn test_saver_directory() {
    let input = TempDir::new().unwrap();
    populate(&input);
    let output = TempDir::new().unwrap();

    let collection = FolderCollection::new(input.path(), LoaderRegistry::new(), false).unwrap();
    let mut saver = CollectionSaver::new(output.path(), OutputFormat::Yaml, None).unwrap();
    for doc in collection.documents() {
        saver.save(&doc.unwrap()).unwrap();
    }
    assert_eq!(saver.finish().unwrap(), 2);

    let mut names: Vec<String> = fs::read_dir(output.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("001-") && names[0].ends_with(".yml"));
    assert!(names[1].starts_with("002-"));

    let back = SourceDocument::load(&output.path().join(&names[0])).unwrap();
    assert_eq!(back.metadata().get_str("document", "origin"), Some("csv"));
}

#[test]
fn test_saver_ndjson() {
    let output = TempDir::new().unwrap();
    let path = output.path().join("all.ndjson");

    let mut saver = CollectionSaver::new(&path, OutputFormat::Ndjson, None).unwrap();
    for n in 0..3 {
        let mut meta = Metadata::new();
        meta.set("document", "id", format!("doc/{n}"));
        saver.save(&SourceDocument::sequence(vec![], meta)).unwrap();
    }
    saver.finish().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    let doc = SourceDocument::from_json_str("line", lines[2]).unwrap();
    assert_eq!(doc.id(), "doc/2");
}

#[test]
fn test_saver_rejects_file_for_directory_output() {
    let output = TempDir::new().unwrap();
    let file = output.path().join("out.yml");
    fs::write(&file, "").unwrap();
    assert!(matches!(
        CollectionSaver::new(&file, OutputFormat::Yaml, None),
        Err(PreprocessError::Config(_))
    ));
}
