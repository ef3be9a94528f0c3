//! Office Open XML packaging helpers shared by the DOCX, XLSX and PPTX
//! writers.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::Metadata;

pub(crate) const NS_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_CONTENT_TYPES: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub(crate) const NS_OFFICE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) fn xml_error(err: impl std::fmt::Display) -> Error {
    Error::Serialization(format!("XML: {}", err))
}

fn zip_error(err: impl std::fmt::Display) -> Error {
    Error::Serialization(format!("ZIP: {}", err))
}

/// Drop characters that XML 1.0 cannot carry.
pub(crate) fn xml_safe(text: &str) -> Cow<'_, str> {
    let invalid = |c: char| (c < ' ' && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{fffe}';
    if text.chars().any(invalid) {
        Cow::Owned(text.chars().filter(|&c| !invalid(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Streaming XML part writer.
pub(crate) struct XmlPart {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlPart {
    /// Start a part with the standalone XML declaration.
    pub fn new() -> Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    pub fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for &attr in attrs {
            elem.push_attribute(attr);
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_error)
    }

    pub fn end(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let mut elem = BytesStart::new(name);
        for &attr in attrs {
            elem.push_attribute(attr);
        }
        self.writer
            .write_event(Event::Empty(elem))
            .map_err(xml_error)
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        let safe = xml_safe(text);
        self.writer
            .write_event(Event::Text(BytesText::new(&safe)))
            .map_err(xml_error)
    }

    /// `<name attrs>text</name>`
    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attrs)?;
        self.text(text)?;
        self.end(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// A zip package under construction.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl Package {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub fn add(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.zip.start_file(path, self.options).map_err(zip_error)?;
        self.zip.write_all(bytes).map_err(zip_error)
    }

    pub fn add_part(&mut self, path: &str, part: XmlPart) -> Result<()> {
        self.add(path, &part.finish())
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }
}

/// `[Content_Types].xml` with xml/rels defaults and per-part overrides.
pub(crate) fn content_types(overrides: &[(String, &str)]) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.relationships+xml",
            ),
        ],
    )?;
    xml.empty(
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    xml.empty(
        "Override",
        &[
            ("PartName", "/docProps/core.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-package.core-properties+xml",
            ),
        ],
    )?;
    for (part, content_type) in overrides {
        xml.empty(
            "Override",
            &[("PartName", part.as_str()), ("ContentType", content_type)],
        )?;
    }
    xml.end("Types")?;
    Ok(xml)
}

/// A relationships part from `(id, type, target)` triples.
pub(crate) fn relationships(rels: &[(String, &str, String)]) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start("Relationships", &[("xmlns", NS_RELATIONSHIPS)])?;
    for (id, rel_type, target) in rels {
        xml.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", rel_type),
                ("Target", target.as_str()),
            ],
        )?;
    }
    xml.end("Relationships")?;
    Ok(xml)
}

/// Package-level `_rels/.rels` pointing at the main part and core properties.
pub(crate) fn root_relationships(main_part: &str) -> Result<XmlPart> {
    relationships(&[
        ("rId1".to_string(), REL_OFFICE_DOCUMENT, main_part.to_string()),
        (
            "rId2".to_string(),
            REL_CORE_PROPERTIES,
            "docProps/core.xml".to_string(),
        ),
    ])
}

/// `docProps/core.xml` from document metadata.
pub(crate) fn core_properties(metadata: &Metadata) -> Result<XmlPart> {
    let mut xml = XmlPart::new()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    if let Some(title) = &metadata.title {
        xml.element("dc:title", &[], title)?;
    }
    if let Some(subject) = &metadata.subject {
        xml.element("dc:subject", &[], subject)?;
    }
    if let Some(author) = &metadata.author {
        xml.element("dc:creator", &[], author)?;
    }
    if let Some(keywords) = &metadata.keywords {
        xml.element("cp:keywords", &[], keywords)?;
    }
    if let Some(created) = &metadata.created {
        let stamp = created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        xml.element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    }
    xml.end("cp:coreProperties")?;
    Ok(xml)
}
