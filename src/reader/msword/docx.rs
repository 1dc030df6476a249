//! Minimal reader for WordprocessingML packages (`.docx`).
//!
//! Only what the loader needs: body paragraphs with their style names, and
//! the core document properties.

use super::heading::Paragraph;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const CORE_PART: &str = "docProps/core.xml";

/// Maximum decompressed bytes read from a single package part
const MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

/// Style of paragraphs with no explicit style
const DEFAULT_STYLE: &str = "Normal";

type DocxResult<T> = std::result::Result<T, String>;

/// Contents of a Word package
#[derive(Debug, Default)]
pub struct DocxPackage {
    pub paragraphs: Vec<Paragraph>,
    /// Core properties: `title`, `author`, `category`, `date`
    pub properties: Map<String, Value>,
}

impl DocxPackage {
    pub fn read<R: Read + Seek>(reader: R) -> DocxResult<Self> {
        let mut archive = ZipArchive::new(reader).map_err(|e| e.to_string())?;

        let document = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| format!("{DOCUMENT_PART} not found"))?;
        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => read_style_names(&xml)?,
            None => HashMap::new(),
        };
        let properties = match read_part(&mut archive, CORE_PART)? {
            Some(xml) => read_core_properties(&xml)?,
            None => Map::new(),
        };

        Ok(Self {
            paragraphs: read_paragraphs(&document, &styles)?,
            properties,
        })
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> DocxResult<Option<Vec<u8>>> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_PART_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| e.to_string())?;
    if out.len() as u64 >= MAX_PART_BYTES {
        return Err(format!("{name} exceeds size limit ({MAX_PART_BYTES} bytes)"));
    }
    Ok(Some(out))
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Built-in style names are stored lowercase ("heading 1")
fn display_style_name(name: &str) -> String {
    match name.strip_prefix("heading ") {
        Some(rest) => format!("Heading {rest}"),
        None => name.to_string(),
    }
}

/// Map of paragraph style ids to style names
fn read_style_names(xml: &[u8]) -> DocxResult<HashMap<String, String>> {
    let mut names = HashMap::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"style" => {
                current = attribute(&e, b"styleId");
            }
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current.as_ref(), attribute(&e, b"val")) {
                    names.insert(id.clone(), display_style_name(&name));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"style" => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

/// Paragraph being collected from the document body
#[derive(Default)]
struct BodyState {
    paragraphs: Vec<Paragraph>,
    current: Option<(String, Option<String>)>,
    table_depth: usize,
    in_properties: bool,
    in_text: bool,
}

impl BodyState {
    fn open(&mut self, e: &BytesStart<'_>) {
        match e.local_name().as_ref() {
            b"tbl" => self.table_depth += 1,
            b"p" if self.table_depth == 0 => self.current = Some((String::new(), None)),
            b"pPr" => self.in_properties = true,
            b"pStyle" => {
                if let Some((_, style)) = self.current.as_mut() {
                    *style = attribute(e, b"val");
                }
            }
            b"t" => self.in_text = true,
            b"tab" if !self.in_properties => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8], styles: &HashMap<String, String>) {
        match name {
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"p" => {
                if let Some((text, style)) = self.current.take() {
                    let style = match style {
                        Some(id) => styles.get(&id).cloned().unwrap_or(id),
                        None => DEFAULT_STYLE.to_string(),
                    };
                    self.paragraphs.push(Paragraph::new(text, style));
                }
            }
            b"pPr" => self.in_properties = false,
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((current, _)) = self.current.as_mut() {
            current.push_str(text);
        }
    }
}

/// Body paragraphs in document order; paragraphs inside tables are skipped
fn read_paragraphs(xml: &[u8], styles: &HashMap<String, String>) -> DocxResult<Vec<Paragraph>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut state = BodyState::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => state.open(&e),
            Ok(Event::Empty(e)) => {
                state.open(&e);
                state.close(e.local_name().as_ref(), styles);
            }
            Ok(Event::End(e)) => state.close(e.local_name().as_ref(), styles),
            Ok(Event::Text(t)) if state.in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                state.push_text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(state.paragraphs)
}

/// Core properties, renamed to document metadata keys
fn read_core_properties(xml: &[u8]) -> DocxResult<Map<String, Value>> {
    let mut properties = Map::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut field: Option<&'static str> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                field = match e.local_name().as_ref() {
                    b"title" => Some("title"),
                    b"creator" => Some("author"),
                    b"category" => Some("category"),
                    b"modified" => Some("date"),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                if let Some(key) = field {
                    let value = t.unescape().map_err(|e| e.to_string())?;
                    let value = match key {
                        "date" => value.trim().to_string(),
                        _ => value.replace('\n', " "),
                    };
                    if !value.trim().is_empty() {
                        properties.insert(key.to_string(), Value::String(value));
                    }
                }
            }
            Ok(Event::End(_)) => field = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(properties)
}

#[cfg(test)]
mod docx_tests {
    use super::*;

    #[test]
    fn test_body_paragraphs_and_styles() {
        let styles = br#"<w:styles xmlns:w="w">
            <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
            <w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/></w:style>
        </w:styles>"#;
        let document = br#"<w:document xmlns:w="w"><w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/><w:tabs><w:tab w:val="left"/></w:tabs></w:pPr>
                <w:r><w:t>Intro</w:t></w:r></w:p>
            <w:p><w:r><w:t xml:space="preserve">a &amp; </w:t><w:tab/><w:t>b</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            <w:p/>
            <w:p><w:pPr><w:pStyle w:val="Custom"/></w:pPr><w:r><w:t>x</w:t><w:br/><w:t>y</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let names = read_style_names(styles).unwrap();
        assert_eq!(names["Heading1"], "Heading 1");

        let paragraphs = read_paragraphs(document, &names).unwrap();
        assert_eq!(
            paragraphs,
            vec![
                Paragraph::new("Intro", "Heading 1"),
                Paragraph::new("a & \tb", "Normal"),
                Paragraph::new("", "Normal"),
                Paragraph::new("x\ny", "Custom"),
            ]
        );
    }

    #[test]
    fn test_core_properties() {
        let core = br#"<cp:coreProperties xmlns:cp="cp" xmlns:dc="dc" xmlns:dcterms="dcterms">
            <dc:title>Annual
report</dc:title><dc:creator>J. Doe</dc:creator><cp:keywords>k</cp:keywords>
            <dcterms:modified>2023-05-01T10:00:00Z</dcterms:modified>
        </cp:coreProperties>"#;
        let props = read_core_properties(core).unwrap();
        assert_eq!(props["title"], "Annual report");
        assert_eq!(props["author"], "J. Doe");
        assert_eq!(props["date"], "2023-05-01T10:00:00Z");
        assert!(!props.contains_key("keywords"));
    }
}
